use serde::Serialize;
use typedump::DumpSummary;

use crate::app::GlobalOptions;

/// Print `data` as JSON (if `--json`) or call `display_fn` for human-readable output.
pub fn print_output<T: Serialize>(
    data: &T,
    opts: &GlobalOptions,
    display_fn: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if opts.json {
        let json = serde_json::to_string_pretty(data)?;
        println!("{json}");
    } else {
        display_fn(data);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct FailedWrite {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticEntry {
    pub severity: String,
    pub category: String,
    pub token: Option<String>,
    pub message: String,
}

/// Serializable form of a [`DumpSummary`].
#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    pub module: String,
    pub output_dir: String,
    pub methods: usize,
    pub classes: usize,
    pub pages_written: usize,
    pub failed_writes: Vec<FailedWrite>,
    pub diagnostics: Vec<DiagnosticEntry>,
}

impl From<&DumpSummary> for SummaryOutput {
    fn from(summary: &DumpSummary) -> Self {
        SummaryOutput {
            module: summary.module.clone(),
            output_dir: summary.output_dir.display().to_string(),
            methods: summary.totals.methods,
            classes: summary.totals.classes,
            pages_written: summary.pages_written,
            failed_writes: summary
                .failed_writes
                .iter()
                .map(|failure| FailedWrite {
                    path: failure.path.display().to_string(),
                    error: failure.error.to_string(),
                })
                .collect(),
            diagnostics: summary
                .diagnostics
                .iter()
                .map(|diagnostic| DiagnosticEntry {
                    severity: diagnostic.severity.to_string(),
                    category: diagnostic.category.to_string(),
                    token: diagnostic.token.map(|token| token.to_string()),
                    message: diagnostic.message.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io, path::PathBuf, sync::Arc};

    use typedump::{
        diagnostics::{DiagnosticCategory, Diagnostics},
        writer::WriteFailure,
        RunTotals,
    };

    use super::*;

    #[test]
    fn summary_json() {
        let diagnostics = Diagnostics::new();
        diagnostics.error(DiagnosticCategory::Type, "bad signature");

        let summary = DumpSummary {
            module: "Assembly-CSharp".to_string(),
            totals: RunTotals {
                methods: 3,
                classes: 2,
            },
            output_dir: PathBuf::from("Parsed/Game"),
            pages_written: 1,
            failed_writes: vec![WriteFailure {
                path: PathBuf::from("Parsed/Game/Enemy.txt"),
                error: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            }],
            diagnostics: Arc::new(diagnostics),
        };

        let output = SummaryOutput::from(&summary);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["module"], "Assembly-CSharp");
        assert_eq!(json["methods"], 3);
        assert_eq!(json["classes"], 2);
        assert_eq!(json["failed_writes"][0]["error"], "denied");
        assert_eq!(json["diagnostics"][0]["message"], "bad signature");
        assert!(json["diagnostics"][0]["token"].is_null());
    }
}
