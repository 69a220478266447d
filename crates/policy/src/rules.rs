//! Permissiveness rules applied to normalized statements.

use crate::{Origin, PolicyDocument, Statement};
use iamscan_core::{Finding, Location, Rule};

/// `*`, `*:*` or a whole-service wildcard such as `s3:*`.
pub fn has_action_wildcard<S: AsRef<str>>(values: &[S]) -> bool {
    values.iter().any(|v| {
        let v = v.as_ref().trim().to_lowercase();
        v == "*" || v == "*:*" || v.ends_with(":*")
    })
}

/// Only the universal resource `*`; wildcards inside ARNs do not count.
pub fn has_resource_star<S: AsRef<str>>(values: &[S]) -> bool {
    values.iter().any(|v| v.as_ref().trim() == "*")
}

/// Findings for one statement, in rule-table order.
pub fn evaluate_statement(st: &Statement, statement_id: &str, loc: &Location<'_>) -> Vec<Finding> {
    let mut out = Vec::new();
    if st.is_allow() {
        if has_action_wildcard(st.action.as_slice()) {
            out.push(Finding::new(
                Rule::AllowActionWildcard,
                loc,
                statement_id,
                format!(r#"Effect "Allow" with Action wildcard ({:?})"#, st.action.as_slice()),
            ));
        }
        if has_resource_star(st.resource.as_slice()) {
            out.push(Finding::new(Rule::AllowResourceStar, loc, statement_id, r#"Effect "Allow" with Resource "*""#));
        }
    }
    if let Origin::Native { unresolved } = st.origin {
        let mut reasons = Vec::new();
        if unresolved { reasons.push("dynamic or empty actions/resources"); }
        if !st.not_action.is_empty() { reasons.push("not_actions"); }
        if !st.not_resource.is_empty() { reasons.push("not_resources"); }
        if !reasons.is_empty() {
            out.push(Finding::new(
                Rule::NeedsManualReview,
                loc,
                statement_id,
                format!("Uses {}; review for permissiveness.", reasons.join(", ")),
            ));
        }
    }
    out
}

/// Evaluates every statement of a decoded document. Statements without a sid
/// are identified by their 1-based position (`#2`).
pub fn evaluate_document(doc: &PolicyDocument, loc: &Location<'_>) -> Vec<Finding> {
    doc.statement
        .iter()
        .enumerate()
        .flat_map(|(i, st)| {
            let id = st.sid().map(str::to_string).unwrap_or_else(|| format!("#{}", i + 1));
            evaluate_statement(st, &id, loc)
        })
        .collect()
}
