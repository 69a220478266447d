use anyhow::Result;
use clap::ValueEnum;
use iamscan_core::Finding;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Table,
    Json,
}

pub fn render(findings: &[Finding], format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(format!("{}\n", serde_json::to_string_pretty(findings)?)),
        Format::Table => Ok(table(findings)),
    }
}

/// SEVERITY, RULE, FILE:LINE, DETAILS; every column but the last padded to
/// its widest cell plus two spaces.
fn table(findings: &[Finding]) -> String {
    let mut rows: Vec<[String; 4]> = vec![["SEVERITY".into(), "RULE".into(), "FILE:LINE".into(), "DETAILS".into()]];
    for f in findings {
        rows.push([
            f.severity.to_string(),
            f.rule.to_string(),
            format!("{}:{}", f.file, f.line),
            f.details.clone(),
        ]);
    }
    let mut widths = [0usize; 3];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let mut out = String::new();
    for row in &rows {
        for (cell, w) in row.iter().zip(widths) {
            out.push_str(cell);
            out.extend(std::iter::repeat(' ').take(w - cell.chars().count() + 2));
        }
        out.push_str(&row[3]);
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
        out.push('\n');
    }
    out
}
