//! Conservative static evaluation of attribute expressions.
//!
//! Only literals, constant templates and tuples made of those resolve.
//! `None` means "not statically known"; it is never the same thing as an
//! empty string or an empty list.

use crate::syntax::{Expr, TemplatePart};

/// Resolve `expr` to a single string.
pub fn resolve_string(expr: &Expr) -> Option<String> {
    match expr {
        Expr::String(s) => Some(s.clone()),
        Expr::Number(n) => Some(n.clone()),
        Expr::Bool(b) => Some(b.to_string()),
        Expr::Template(parts) => match parts.as_slice() {
            [TemplatePart::Literal(s)] => Some(s.clone()),
            _ => None,
        },
        Expr::Null | Expr::Tuple(_) | Expr::Other(_) => None,
    }
}

/// Resolve `expr` to an ordered list of strings.
///
/// A tuple resolves only when every element does; a lone scalar resolves to
/// a one-element list.
pub fn resolve_string_list(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Tuple(items) => items.iter().map(resolve_string).collect(),
        other => resolve_string(other).map(|s| vec![s]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Expr { Expr::String(v.to_string()) }

    #[test]
    fn primitive_literals_resolve() {
        assert_eq!(resolve_string(&s("Allow")).as_deref(), Some("Allow"));
        assert_eq!(resolve_string(&Expr::Number("42".into())).as_deref(), Some("42"));
        assert_eq!(resolve_string(&Expr::Bool(true)).as_deref(), Some("true"));
        assert_eq!(resolve_string(&s("")).as_deref(), Some(""));
        assert_eq!(resolve_string(&Expr::Null), None);
    }

    #[test]
    fn constant_template_resolves() {
        let t = Expr::template(["{\"Version\":\"2012-10-17\"}"]);
        assert_eq!(resolve_string(&t).as_deref(), Some("{\"Version\":\"2012-10-17\"}"));
    }

    #[test]
    fn interpolated_template_does_not_resolve() {
        let t = Expr::Template(vec![
            TemplatePart::Literal("arn:aws:s3:::".into()),
            TemplatePart::Interpolation,
        ]);
        assert_eq!(resolve_string(&t), None);
        assert_eq!(resolve_string(&Expr::Template(vec![TemplatePart::Interpolation])), None);
        assert_eq!(resolve_string(&Expr::Template(vec![TemplatePart::Directive])), None);
        assert_eq!(resolve_string(&Expr::Template(vec![])), None);
    }

    #[test]
    fn dynamic_expressions_do_not_resolve() {
        assert_eq!(resolve_string(&Expr::Other("function call")), None);
        assert_eq!(resolve_string_list(&Expr::Other("variable")), None);
    }

    #[test]
    fn tuple_of_literals_resolves_in_order() {
        let t = Expr::Tuple(vec![s("s3:GetObject"), Expr::template(["s3:PutObject"]), Expr::Number("1".into())]);
        assert_eq!(
            resolve_string_list(&t),
            Some(vec!["s3:GetObject".to_string(), "s3:PutObject".to_string(), "1".to_string()])
        );
    }

    #[test]
    fn tuple_with_one_dynamic_element_is_unresolved() {
        let t = Expr::Tuple(vec![s("s3:GetObject"), Expr::Other("traversal")]);
        assert_eq!(resolve_string_list(&t), None);
        let nested = Expr::Tuple(vec![Expr::Tuple(vec![s("*")])]);
        assert_eq!(resolve_string_list(&nested), None);
    }

    #[test]
    fn empty_tuple_is_resolved_empty() {
        assert_eq!(resolve_string_list(&Expr::Tuple(vec![])), Some(vec![]));
    }

    #[test]
    fn scalar_resolves_to_singleton_list() {
        assert_eq!(resolve_string_list(&s("*")), Some(vec!["*".to_string()]));
    }
}
