use crate::syntax::{BlockRef, Pos};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of `Finding::scanner` for everything this workspace reports.
pub const SCANNER_NAME: &str = "terraform";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity { Low, Medium, High }

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self { Severity::Low => "LOW", Severity::Medium => "MEDIUM", Severity::High => "HIGH" }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    AllowActionWildcard,
    AllowResourceStar,
    NeedsManualReview,
    ParseError,
    UnknownDynamicPolicy,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::AllowActionWildcard => "allow_action_wildcard",
            Rule::AllowResourceStar => "allow_resource_star",
            Rule::NeedsManualReview => "needs_manual_review",
            Rule::ParseError => "parse_error",
            Rule::UnknownDynamicPolicy => "unknown_dynamic_policy",
        }
    }

    pub fn severity(&self) -> Severity {
        // every rule in the set is currently HIGH
        match self {
            Rule::AllowActionWildcard
            | Rule::AllowResourceStar
            | Rule::NeedsManualReview
            | Rule::ParseError
            | Rule::UnknownDynamicPolicy => Severity::High,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Where a finding points: file, block and source position.
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    pub file: &'a str,
    pub block_ref: &'a BlockRef,
    pub pos: Pos,
}

/// One detected issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub scanner: String,
    pub rule: Rule,
    pub severity: Severity,
    pub file: String,
    pub line: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub column: usize,
    pub block_ref: String,
    pub statement_id: String,
    pub details: String,
}

fn is_zero(n: &usize) -> bool { *n == 0 }

impl Finding {
    pub fn new(rule: Rule, loc: &Location<'_>, statement_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            scanner: SCANNER_NAME.to_string(),
            rule,
            severity: rule.severity(),
            file: loc.file.to_string(),
            line: loc.pos.line,
            column: loc.pos.column,
            block_ref: loc.block_ref.to_string(),
            statement_id: statement_id.into(),
            details: details.into(),
        }
    }
}

/// Append-only, ordered collection of findings for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    findings: Vec<Finding>,
}

impl Report {
    pub fn new() -> Self { Self::default() }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    pub fn findings(&self) -> &[Finding] { &self.findings }

    pub fn len(&self) -> usize { self.findings.len() }

    pub fn is_empty(&self) -> bool { self.findings.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(block_ref: &BlockRef) -> Location<'_> {
        Location { file: "main.tf", block_ref, pos: Pos::new(7, 3) }
    }

    #[test]
    fn finding_serializes_with_canonical_names() {
        let r = BlockRef::of(&crate::Block::new("resource", ["aws_iam_policy", "p"], Pos::default()));
        let f = Finding::new(Rule::AllowResourceStar, &loc(&r), "#1", "x");
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["scanner"], "terraform");
        assert_eq!(v["rule"], "allow_resource_star");
        assert_eq!(v["severity"], "HIGH");
        assert_eq!(v["line"], 7);
        assert_eq!(v["column"], 3);
        assert_eq!(v["block_ref"], "resource.aws_iam_policy.p");
        assert_eq!(v["statement_id"], "#1");
    }

    #[test]
    fn zero_column_is_omitted() {
        let r = BlockRef::of(&crate::Block::new("data", ["t", "n"], Pos::default()));
        let f = Finding::new(Rule::ParseError, &Location { file: "a.tf", block_ref: &r, pos: Pos::new(1, 0) }, "", "");
        let v = serde_json::to_value(&f).unwrap();
        assert!(v.get("column").is_none());
    }

    #[test]
    fn rule_names_match_display() {
        for rule in [
            Rule::AllowActionWildcard,
            Rule::AllowResourceStar,
            Rule::NeedsManualReview,
            Rule::ParseError,
            Rule::UnknownDynamicPolicy,
        ] {
            let json = serde_json::to_value(rule).unwrap();
            assert_eq!(json, rule.as_str());
            assert_eq!(rule.severity(), Severity::High);
        }
    }

    #[test]
    fn report_keeps_append_order() {
        let r = BlockRef::of(&crate::Block::new("data", ["t", "n"], Pos::default()));
        let mut report = Report::new();
        report.extend([Finding::new(Rule::ParseError, &loc(&r), "", "first")]);
        report.extend(vec![
            Finding::new(Rule::ParseError, &loc(&r), "", "second"),
            Finding::new(Rule::ParseError, &loc(&r), "", "second"),
        ]);
        let details: Vec<_> = report.findings().iter().map(|f| f.details.as_str()).collect();
        assert_eq!(details, vec!["first", "second", "second"]);
        assert_eq!(report.len(), 3);
    }
}
