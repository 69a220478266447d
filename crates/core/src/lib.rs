pub mod finding;
pub mod resolve;
pub mod syntax;

pub use finding::{Finding, Location, Report, Rule, Severity, SCANNER_NAME};
pub use resolve::{resolve_string, resolve_string_list};
pub use syntax::{Attribute, Block, BlockRef, Body, Expr, Pos, TemplatePart};

/// Inspects one top-level block of a file and reports what it finds.
///
/// Implementations decide for themselves which blocks they care about and
/// return nothing for the rest. They must not panic on malformed blocks; a
/// block that cannot be judged becomes a finding or is skipped.
pub trait BlockAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;
    fn analyze(&self, file: &str, block: &Block) -> Vec<Finding>;
}

/// Runs a fixed set of analyzers over parsed files.
#[derive(Default)]
pub struct Scanner {
    analyzers: Vec<Box<dyn BlockAnalyzer>>,
}

impl Scanner {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, analyzer: impl BlockAnalyzer + 'static) -> Self {
        self.analyzers.push(Box::new(analyzer));
        self
    }

    pub fn analyzers(&self) -> impl Iterator<Item = &str> + '_ {
        self.analyzers.iter().map(|a| a.name())
    }

    /// Findings for one file, in block order. Within a block, analyzers run
    /// in registration order.
    pub fn scan_body(&self, file: &str, body: &Body) -> Vec<Finding> {
        let mut out = Vec::new();
        for block in &body.blocks {
            for a in &self.analyzers {
                let found = a.analyze(file, block);
                if !found.is_empty() {
                    tracing::debug!(file, block = %block.reference(), analyzer = a.name(), count = found.len(), "findings");
                }
                out.extend(found);
            }
        }
        out
    }
}
