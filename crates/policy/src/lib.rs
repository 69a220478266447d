//! Normalized IAM policy model shared by every extraction path.

pub mod rules;

use serde::{Deserialize, Deserializer};
use serde_json::{Map as JsonMap, Value as Json};
use thiserror::Error;

pub use rules::{evaluate_document, evaluate_statement, has_action_wildcard, has_resource_star};

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("policy document is empty")]
    Empty,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A field that may be written as `"x"` or `["x", "y"]`.
///
/// Anything else (numbers, objects, mixed lists) normalizes to empty rather
/// than failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringOrList(Vec<String>);

impl StringOrList {
    pub fn from_json(v: &Json) -> Self {
        match v {
            Json::String(s) => StringOrList(vec![s.clone()]),
            Json::Array(items) => StringOrList(
                items
                    .iter()
                    .map(|i| i.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .unwrap_or_default(),
            ),
            _ => StringOrList::default(),
        }
    }

    pub fn as_slice(&self) -> &[String] { &self.0 }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn iter(&self) -> std::slice::Iter<'_, String> { self.0.iter() }
}

impl From<Vec<String>> for StringOrList {
    fn from(v: Vec<String>) -> Self { StringOrList(v) }
}

impl<'de> Deserialize<'de> for StringOrList {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Json::deserialize(d)?;
        Ok(StringOrList::from_json(&v))
    }
}

/// How a statement was authored. Only native statements can carry actions or
/// resources that resolved to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    #[default]
    InlineJson,
    Native { unresolved: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub action: StringOrList,
    #[serde(default)]
    pub not_action: StringOrList,
    #[serde(default)]
    pub resource: StringOrList,
    #[serde(default)]
    pub not_resource: StringOrList,
    /// Never inspected, only carried along.
    #[serde(default)]
    pub condition: Option<JsonMap<String, Json>>,
    #[serde(skip)]
    pub origin: Origin,
}

impl Statement {
    pub fn is_allow(&self) -> bool { self.effect.trim().eq_ignore_ascii_case("allow") }

    pub fn is_deny(&self) -> bool { self.effect.trim().eq_ignore_ascii_case("deny") }

    pub fn has_condition(&self) -> bool { self.condition.as_ref().is_some_and(|c| !c.is_empty()) }

    /// Explicit sid when it is not blank.
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub statement: Vec<Statement>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Statement>),
    One(Box<Statement>),
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Statement>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(d)? {
        Some(OneOrMany::Many(v)) => v,
        Some(OneOrMany::One(s)) => vec![*s],
        None => Vec::new(),
    })
}

impl PolicyDocument {
    /// Decode a serialized JSON policy.
    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PolicyError::Empty);
        }
        Ok(serde_json::from_str(raw)?)
    }
}
