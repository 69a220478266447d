//! Parser-independent view of a Terraform file: blocks, attributes and the
//! handful of expression shapes the resolver cares about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based source position. `Pos::default()` (0:0) means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self { Self { line, column } }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One piece of a string template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    /// `${ ... }`
    Interpolation,
    /// `%{ ... }`
    Directive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    /// Kept in its source spelling.
    Number(String),
    /// Quoted string with nothing to substitute.
    String(String),
    /// Quoted string or heredoc, split into parts.
    Template(Vec<TemplatePart>),
    /// `[a, b, c]`
    Tuple(Vec<Expr>),
    /// Anything else (calls, references, conditionals, objects, operators).
    /// The label is only used for diagnostics.
    Other(&'static str),
}

impl Expr {
    pub fn template<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::Template(literals.into_iter().map(|s| TemplatePart::Literal(s.into())).collect())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Null => "null",
            Expr::Bool(_) => "bool",
            Expr::Number(_) => "number",
            Expr::String(_) => "string",
            Expr::Template(_) => "template",
            Expr::Tuple(_) => "tuple",
            Expr::Other(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub expr: Expr,
    pub pos: Pos,
}

impl Attribute {
    pub fn new(key: impl Into<String>, expr: Expr, pos: Pos) -> Self {
        Self { key: key.into(), expr, pos }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
}

impl Body {
    /// First attribute named `key`.
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.key == key)
    }

    pub fn has_attribute(&self, key: &str) -> bool { self.attribute(key).is_some() }

    /// Nested blocks of the given type, in source order.
    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
    /// Start of the block header.
    pub pos: Pos,
}

impl Block {
    pub fn new<I, S>(kind: impl Into<String>, labels: I, pos: Pos) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            body: Body::default(),
            pos,
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Attribute> { self.body.attribute(key) }

    /// `(type, name)` of a `resource`/`data` style block with two labels.
    pub fn type_and_name(&self) -> Option<(&str, &str)> {
        match self.labels.as_slice() {
            [ty, name, ..] => Some((ty.as_str(), name.as_str())),
            _ => None,
        }
    }

    pub fn reference(&self) -> BlockRef { BlockRef::of(self) }
}

/// Stable name of a block: its type followed by its labels, dot separated,
/// e.g. `resource.aws_iam_policy.admin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockRef(String);

impl BlockRef {
    pub fn of(block: &Block) -> Self {
        let mut s = block.kind.clone();
        for label in &block.labels {
            s.push('.');
            s.push_str(label);
        }
        BlockRef(s)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_ref_joins_type_and_labels() {
        let b = Block::new("resource", ["aws_iam_policy", "admin"], Pos::new(3, 1));
        assert_eq!(b.reference().as_str(), "resource.aws_iam_policy.admin");
        assert_eq!(b.type_and_name(), Some(("aws_iam_policy", "admin")));
    }

    #[test]
    fn distinct_labels_give_distinct_refs() {
        let a = Block::new("data", ["aws_iam_policy_document", "a"], Pos::default());
        let b = Block::new("data", ["aws_iam_policy_document", "b"], Pos::default());
        let c = Block::new("resource", ["aws_iam_policy_document", "a"], Pos::default());
        assert_ne!(a.reference(), b.reference());
        assert_ne!(a.reference(), c.reference());
    }

    #[test]
    fn single_label_block_has_no_type_and_name() {
        let b = Block::new("provider", ["aws"], Pos::default());
        assert_eq!(b.type_and_name(), None);
        assert_eq!(b.reference().to_string(), "provider.aws");
    }

    #[test]
    fn body_lookups() {
        let body = Body::default()
            .with_attribute(Attribute::new("effect", Expr::String("Allow".into()), Pos::new(2, 3)))
            .with_block(Block::new("statement", Vec::<String>::new(), Pos::new(4, 3)))
            .with_block(Block::new("condition", Vec::<String>::new(), Pos::new(9, 3)))
            .with_block(Block::new("statement", Vec::<String>::new(), Pos::new(12, 3)));
        assert!(body.has_attribute("effect"));
        assert!(!body.has_attribute("actions"));
        let lines: Vec<_> = body.blocks_of("statement").map(|b| b.pos.line).collect();
        assert_eq!(lines, vec![4, 12]);
    }
}
