use iamscan_core::{
    resolve_string, resolve_string_list, Block, BlockAnalyzer, Finding, Location, Rule, Scanner,
};
use iamscan_policy::{evaluate_document, evaluate_statement, Origin, PolicyDocument, Statement};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as Json};
use std::collections::BTreeSet;

/// Resource types whose `policy` attribute holds a serialized JSON policy.
pub fn default_policy_resource_types() -> Vec<String> {
    [
        "aws_iam_policy",
        "aws_iam_role_policy",
        "aws_iam_user_policy",
        "aws_iam_group_policy",
        "aws_s3_bucket_policy",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn default_policy_document_types() -> Vec<String> {
    vec!["aws_iam_policy_document".to_string()]
}

/// Which block types the AWS analyzers look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    /// Replaces the default list when set.
    pub policy_resource_types: Vec<String>,
    /// Added on top of `policy_resource_types`.
    pub extra_policy_resource_types: Vec<String>,
    pub policy_document_types: Vec<String>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            policy_resource_types: default_policy_resource_types(),
            extra_policy_resource_types: Vec::new(),
            policy_document_types: default_policy_document_types(),
        }
    }
}

impl AwsSettings {
    pub fn resource_types(&self) -> impl Iterator<Item = &String> {
        self.policy_resource_types.iter().chain(self.extra_policy_resource_types.iter())
    }

    pub fn scanner(&self) -> Scanner {
        Scanner::new()
            .with(InlinePolicyExtractor::new(self.resource_types().cloned()))
            .with(PolicyDocumentExtractor::new(self.policy_document_types.iter().cloned()))
    }
}

/// `resource` blocks carrying `policy = "<json>"`.
#[derive(Debug, Clone)]
pub struct InlinePolicyExtractor {
    resource_types: BTreeSet<String>,
}

impl InlinePolicyExtractor {
    pub fn new(resource_types: impl IntoIterator<Item = String>) -> Self {
        Self { resource_types: resource_types.into_iter().collect() }
    }

    pub fn handles(&self, resource_type: &str) -> bool { self.resource_types.contains(resource_type) }
}

impl BlockAnalyzer for InlinePolicyExtractor {
    fn name(&self) -> &'static str { "inline_policy" }

    fn analyze(&self, file: &str, block: &Block) -> Vec<Finding> {
        if block.kind != "resource" { return Vec::new(); }
        let Some((ty, _)) = block.type_and_name() else { return Vec::new() };
        if !self.handles(ty) { return Vec::new(); }
        let Some(attr) = block.attribute("policy") else { return Vec::new() };

        let block_ref = block.reference();
        let loc = Location { file, block_ref: &block_ref, pos: attr.pos };
        let Some(raw) = resolve_string(&attr.expr) else {
            tracing::debug!(file, block = %block_ref, expr = attr.expr.kind(), "dynamic policy");
            return vec![Finding::new(
                Rule::UnknownDynamicPolicy,
                &loc,
                "",
                "Policy attribute is dynamic (jsonencode/interpolation). Could not statically analyze.",
            )];
        };
        match PolicyDocument::from_json(&raw) {
            Ok(doc) => evaluate_document(&doc, &loc),
            Err(e) => vec![Finding::new(
                Rule::ParseError,
                &loc,
                "",
                format!("Could not parse JSON policy (possibly dynamic/interpolated): {e}"),
            )],
        }
    }
}

/// `data "aws_iam_policy_document"` blocks, read statement by statement.
#[derive(Debug, Clone)]
pub struct PolicyDocumentExtractor {
    document_types: BTreeSet<String>,
}

impl PolicyDocumentExtractor {
    pub fn new(document_types: impl IntoIterator<Item = String>) -> Self {
        Self { document_types: document_types.into_iter().collect() }
    }
}

impl BlockAnalyzer for PolicyDocumentExtractor {
    fn name(&self) -> &'static str { "policy_document" }

    fn analyze(&self, file: &str, block: &Block) -> Vec<Finding> {
        if block.kind != "data" { return Vec::new(); }
        match block.type_and_name() {
            Some((ty, _)) if self.document_types.contains(ty) => {}
            _ => return Vec::new(),
        }
        let block_ref = block.reference();
        let mut out = Vec::new();
        for st in block.body.blocks_of("statement") {
            let stmt = native_statement(st);
            let loc = Location { file, block_ref: &block_ref, pos: st.pos };
            out.extend(evaluate_statement(&stmt, stmt.sid().unwrap_or(""), &loc));
        }
        out
    }
}

/// Builds a statement from a `statement { ... }` block.
///
/// A missing or unresolvable `effect` is left empty so neither Allow nor Deny
/// matches. `actions` or `resources` written in source but yielding no values
/// marks the statement for manual review.
pub fn native_statement(st: &Block) -> Statement {
    let effect = st
        .attribute("effect")
        .and_then(|a| resolve_string(&a.expr))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let list = |key: &str| st.attribute(key).and_then(|a| resolve_string_list(&a.expr));
    let unresolved = ["actions", "resources"]
        .into_iter()
        .any(|key| st.body.has_attribute(key) && list(key).map_or(true, |v| v.is_empty()));

    Statement {
        sid: st.attribute("sid").and_then(|a| resolve_string(&a.expr)),
        effect,
        action: list("actions").unwrap_or_default().into(),
        not_action: list("not_actions").unwrap_or_default().into(),
        resource: list("resources").unwrap_or_default().into(),
        not_resource: list("not_resources").unwrap_or_default().into(),
        condition: native_conditions(st),
        origin: Origin::Native { unresolved },
    }
}

// condition { test = "..." variable = "..." values = [...] }
fn native_conditions(st: &Block) -> Option<JsonMap<String, Json>> {
    let mut map = JsonMap::new();
    for c in st.body.blocks_of("condition") {
        let test = c.attribute("test").and_then(|a| resolve_string(&a.expr)).unwrap_or_else(|| "?".into());
        let variable = c.attribute("variable").and_then(|a| resolve_string(&a.expr)).unwrap_or_else(|| "?".into());
        let values = c.attribute("values").and_then(|a| resolve_string_list(&a.expr)).unwrap_or_default();
        let entry = map.entry(test).or_insert_with(|| json!({}));
        if let Some(obj) = entry.as_object_mut() {
            obj.insert(variable, json!(values));
        }
    }
    (!map.is_empty()).then_some(map)
}
