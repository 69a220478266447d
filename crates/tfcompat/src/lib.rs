//! Terraform (HCL) parsing: turns `.tf` text into the `iamscan_core` syntax tree.

use hcl_edit::expr::Expression;
use hcl_edit::repr::Span;
use hcl_edit::structure::{self, BlockLabel, Structure};
use hcl_edit::template::{Element, Template};
use iamscan_core::{Attribute, Block, Body, Expr, Pos, TemplatePart};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TfError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },
}

pub fn parse_file(path: &Path) -> Result<Body, TfError> {
    let src = std::fs::read_to_string(path).map_err(|source| TfError::Io { path: path.to_path_buf(), source })?;
    parse_str(&src, path)
}

/// `path` is only used in error messages.
pub fn parse_str(src: &str, path: &Path) -> Result<Body, TfError> {
    let body = hcl_edit::parser::parse_body(src)
        .map_err(|e| TfError::Syntax { path: path.to_path_buf(), message: e.to_string() })?;
    let ix = LineIndex::new(src);
    let out = convert_body(&body, &ix);
    tracing::debug!(file = %path.display(), blocks = out.blocks.len(), "parsed");
    Ok(out)
}

/// Byte offset → 1-based line/column (columns count chars).
struct LineIndex<'a> {
    src: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(src: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(src.match_indices('\n').map(|(i, _)| i + 1));
        Self { src, starts }
    }

    fn pos(&self, offset: usize) -> Pos {
        let line = self.starts.partition_point(|&s| s <= offset).max(1) - 1;
        let start = self.starts[line];
        let column = self
            .src
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset.saturating_sub(start));
        Pos::new(line + 1, column + 1)
    }

    fn start_of(&self, span: Option<Range<usize>>) -> Pos {
        span.map(|r| self.pos(r.start)).unwrap_or_default()
    }
}

fn convert_body(body: &structure::Body, ix: &LineIndex<'_>) -> Body {
    let mut out = Body::default();
    for st in body.iter() {
        match st {
            Structure::Attribute(a) => {
                let pos = ix.start_of(a.span().or_else(|| a.key.span()));
                out.attributes.push(Attribute::new(a.key.value().as_str(), convert_expr(&a.value), pos));
            }
            Structure::Block(b) => out.blocks.push(convert_block(b, ix)),
        }
    }
    out
}

fn convert_block(b: &structure::Block, ix: &LineIndex<'_>) -> Block {
    let pos = ix.start_of(b.span().or_else(|| b.ident.span()));
    Block::new(b.ident.value().as_str(), b.labels.iter().map(label), pos).with_body(convert_body(&b.body, ix))
}

fn label(l: &BlockLabel) -> String {
    match l {
        BlockLabel::Ident(i) => i.value().as_str().to_string(),
        BlockLabel::String(s) => s.value().clone(),
    }
}

fn convert_expr(e: &Expression) -> Expr {
    match e {
        Expression::Null(_) => Expr::Null,
        Expression::Bool(b) => Expr::Bool(*b.value()),
        Expression::Number(n) => Expr::Number(n.value().to_string()),
        Expression::String(s) => Expr::String(s.value().clone()),
        Expression::Array(items) => Expr::Tuple(items.iter().map(convert_expr).collect()),
        Expression::StringTemplate(t) => Expr::Template(convert_template(t)),
        Expression::HeredocTemplate(h) => Expr::Template(convert_template(&h.template)),
        Expression::Object(_) => Expr::Other("object"),
        Expression::Variable(_) => Expr::Other("variable"),
        Expression::Traversal(_) => Expr::Other("traversal"),
        Expression::FuncCall(_) => Expr::Other("function call"),
        Expression::Conditional(_) => Expr::Other("conditional"),
        _ => Expr::Other("expression"),
    }
}

/// Adjacent literal elements are merged so a constant template is always a
/// single part.
fn convert_template(t: &Template) -> Vec<TemplatePart> {
    let mut parts: Vec<TemplatePart> = Vec::new();
    for el in t.iter() {
        match el {
            Element::Literal(lit) => match parts.last_mut() {
                Some(TemplatePart::Literal(prev)) => prev.push_str(lit.value()),
                _ => parts.push(TemplatePart::Literal(lit.value().clone())),
            },
            Element::Interpolation(_) => parts.push(TemplatePart::Interpolation),
            Element::Directive(_) => parts.push(TemplatePart::Directive),
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use iamscan_core::resolve_string;

    fn parse(src: &str) -> Body { parse_str(src, Path::new("test.tf")).unwrap() }

    #[test]
    fn line_index_positions() {
        let ix = LineIndex::new("ab\ncd\n\nxé y");
        assert_eq!(ix.pos(0), Pos::new(1, 1));
        assert_eq!(ix.pos(1), Pos::new(1, 2));
        assert_eq!(ix.pos(3), Pos::new(2, 1));
        assert_eq!(ix.pos(7), Pos::new(4, 1));
        // 'é' is two bytes but one column
        assert_eq!(ix.pos(11), Pos::new(4, 4));
    }

    #[test]
    fn blocks_labels_and_positions() {
        let body = parse("# header\nresource \"aws_iam_policy\" \"admin\" {\n  name = \"admin\"\n}\n");
        assert_eq!(body.blocks.len(), 1);
        let b = &body.blocks[0];
        assert_eq!(b.kind, "resource");
        assert_eq!(b.labels, vec!["aws_iam_policy", "admin"]);
        assert_eq!(b.pos.line, 2);
        let name = b.attribute("name").unwrap();
        assert_eq!(name.pos.line, 3);
        assert_eq!(resolve_string(&name.expr).as_deref(), Some("admin"));
    }

    #[test]
    fn nested_blocks_are_kept() {
        let body = parse(
            r#"data "aws_iam_policy_document" "doc" {
  statement {
    actions   = ["s3:*"]
    resources = ["*"]
  }
  statement {
    effect  = "Deny"
    actions = [var.action]
  }
}
"#,
        );
        let doc = &body.blocks[0];
        let stmts: Vec<_> = doc.body.blocks_of("statement").collect();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].pos.line, 2);
        assert_eq!(stmts[1].pos.line, 6);
        assert_eq!(
            iamscan_core::resolve_string_list(&stmts[0].attribute("actions").unwrap().expr),
            Some(vec!["s3:*".to_string()])
        );
        match &stmts[1].attribute("actions").unwrap().expr {
            Expr::Tuple(items) => assert!(matches!(items[0], Expr::Other(_))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn heredoc_without_interpolation_resolves() {
        let body = parse("resource \"aws_iam_policy\" \"p\" {\n  policy = <<EOF\n{\"Version\": \"2012-10-17\"}\nEOF\n}\n");
        let policy = body.blocks[0].attribute("policy").unwrap();
        let text = resolve_string(&policy.expr).unwrap();
        assert_eq!(text.trim(), "{\"Version\": \"2012-10-17\"}");
    }

    #[test]
    fn interpolation_and_calls_do_not_resolve() {
        let body = parse(
            r#"resource "aws_iam_policy" "p" {
  policy = "arn:${var.x}"
  other  = jsonencode({ Version = "2012-10-17" })
  flag   = true
  count  = 3
}
"#,
        );
        let b = &body.blocks[0];
        assert_eq!(resolve_string(&b.attribute("policy").unwrap().expr), None);
        assert_eq!(b.attribute("other").unwrap().expr, Expr::Other("function call"));
        assert_eq!(resolve_string(&b.attribute("flag").unwrap().expr).as_deref(), Some("true"));
        assert_eq!(resolve_string(&b.attribute("count").unwrap().expr).as_deref(), Some("3"));
    }

    #[test]
    fn syntax_error_names_the_file() {
        let err = parse_str("resource \"x\" {\n", Path::new("broken.tf")).unwrap_err();
        assert!(matches!(err, TfError::Syntax { .. }));
        assert!(err.to_string().contains("broken.tf"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_file(&dir.path().join("nope.tf")).unwrap_err();
        assert!(matches!(err, TfError::Io { .. }));
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("main.tf");
        std::fs::write(&p, "data \"aws_iam_policy_document\" \"d\" {}\n").unwrap();
        let body = parse_file(&p).unwrap();
        assert_eq!(body.blocks[0].reference().as_str(), "data.aws_iam_policy_document.d");
    }
}
