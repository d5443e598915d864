//! Report rendering and output files.

use std::path::Path;

use rostermerge_core::contacts::write_contacts_file;

use crate::error::ReconError;
use crate::model::ReconciliationReport;

/// Render the human-readable comparison report.
pub fn render_text(report: &ReconciliationReport) -> String {
    let title = "CONTACT EXTRACTION COMPARISON REPORT";
    let mut lines = vec![
        title.to_string(),
        "=".repeat(title.len()),
        format!("Config: {}", report.meta.config_name),
        format!("Run at: {}", report.meta.run_at),
        String::new(),
        "SUMMARY STATISTICS:".to_string(),
        format!("- Total unique contacts found: {}", report.merged_total),
    ];
    for s in &report.sources {
        let missing = if s.found { "" } else { " (file not found)" };
        lines.push(format!("- {} contacts: {}{missing}", s.name, s.records));
    }

    lines.push(String::new());
    lines.push("UNIQUE CONTACTS BY SOURCE:".to_string());
    for s in &report.sources {
        lines.push(format!("- {} unique: {}", s.name, s.unique));
    }

    lines.push(String::new());
    lines.push("COVERAGE ANALYSIS:".to_string());
    for s in &report.sources {
        lines.push(format!("- {} coverage: {:.1}%", s.name, s.coverage_pct));
    }

    lines.push(String::new());
    lines.push("BEST PERFORMING SOURCE:".to_string());
    lines.push(match &report.best_source {
        Some(best) => format!("{} with {} contacts", best.name, best.records),
        None => "none (no sources)".to_string(),
    });

    let merged = display_name(&report.outputs.merged);
    lines.push(String::new());
    lines.push("OUTPUT FILES:".to_string());
    lines.push(format!("- {merged}: Complete merged contact list"));
    lines.push(format!("- This report: {}", display_name(&report.outputs.report)));
    if let Some(json) = &report.outputs.json {
        lines.push(format!("- {}: Machine-readable report", display_name(json)));
    }

    lines.push(String::new());
    lines.push("RECOMMENDATION:".to_string());
    lines.push(format!(
        "Use the merged contact file ({merged}) as it contains all unique contacts from all sources."
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write the merged contact file, the text report, and the JSON report if
/// one is configured.
pub fn persist(report: &ReconciliationReport) -> Result<(), ReconError> {
    write_contacts_file(&report.outputs.merged, &report.merged)
        .map_err(|e| ReconError::Io(e.to_string()))?;

    std::fs::write(&report.outputs.report, render_text(report)).map_err(|e| {
        ReconError::Io(format!("cannot write {}: {e}", report.outputs.report.display()))
    })?;

    if let Some(path) = &report.outputs.json {
        let json =
            serde_json::to_string_pretty(report).map_err(|e| ReconError::Io(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))?;
    }

    tracing::info!(
        merged = %report.outputs.merged.display(),
        report = %report.outputs.report.display(),
        "wrote merge outputs"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MergeConfig, SourceFile};
    use crate::engine::run;
    use crate::model::{ReconInput, SourceContacts};
    use rostermerge_core::ContactRecord;

    fn sample(json: Option<&str>) -> (MergeConfig, ReconciliationReport) {
        let mut config = MergeConfig {
            sources: vec![SourceFile::new("A", "a.csv"), SourceFile::new("B", "b.csv")],
            ..MergeConfig::default()
        };
        config.output.json = json.map(Into::into);
        let input = ReconInput {
            sources: vec![
                SourceContacts::new(
                    "A",
                    vec![ContactRecord::new("G1", "111"), ContactRecord::new("G1", "222")],
                ),
                SourceContacts::missing("B", "b.csv"),
            ],
        };
        let report = run(&config, &input).unwrap();
        (config, report)
    }

    #[test]
    fn text_sections() {
        let (_, report) = sample(None);
        let text = render_text(&report);
        assert!(text.contains("- Total unique contacts found: 2"));
        assert!(text.contains("- A contacts: 2\n"));
        assert!(text.contains("- B contacts: 0 (file not found)"));
        assert!(text.contains("- A unique: 2"));
        assert!(text.contains("- A coverage: 100.0%"));
        assert!(text.contains("- B coverage: 0.0%"));
        assert!(text.contains("BEST PERFORMING SOURCE:\nA with 2 contacts"));
        assert!(text.contains("- group_contacts_merged.csv: Complete merged contact list"));
        assert!(text.contains("- This report: extraction_comparison_report.txt"));
        assert!(text.contains("Use the merged contact file (group_contacts_merged.csv)"));
    }

    #[test]
    fn text_layout() {
        let (_, report) = sample(None);
        let text = render_text(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "CONTACT EXTRACTION COMPARISON REPORT");
        assert_eq!(lines[1], "=".repeat(lines[0].len()));
        assert!(text.ends_with("contains all unique contacts from all sources.\n"));

        let order = [
            "SUMMARY STATISTICS:",
            "UNIQUE CONTACTS BY SOURCE:",
            "COVERAGE ANALYSIS:",
            "BEST PERFORMING SOURCE:",
            "OUTPUT FILES:",
            "RECOMMENDATION:",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|h| lines.iter().position(|l| l == h).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        // every section after the first is preceded by a blank line
        assert!(positions.iter().all(|&p| lines[p - 1].is_empty()));
    }

    #[test]
    fn persist_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = sample(Some("report.json"));
        let config = config.resolve_paths(dir.path());
        let input = ReconInput {
            sources: vec![SourceContacts::new(
                "A",
                vec![ContactRecord::new("G1", "111"), ContactRecord::new("G1", "111")],
            )],
        };
        let report = run(&config, &input).unwrap();
        persist(&report).unwrap();

        let merged = std::fs::read_to_string(dir.path().join("group_contacts_merged.csv")).unwrap();
        assert_eq!(merged, "group,phone\nG1,111\n");

        let text =
            std::fs::read_to_string(dir.path().join("extraction_comparison_report.txt")).unwrap();
        assert!(text.contains("- report.json: Machine-readable report"));

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("report.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["merged_total"], 1);
        assert_eq!(json["sources"][0]["records"], 2);
        assert_eq!(json["sources"][0]["distinct"], 1);
        assert!(json.get("merged").is_none());
    }

    #[test]
    fn persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (mut config, _) = sample(None);
        config.output.merged = dir.path().join("no/such/dir/merged.csv");
        let input = ReconInput { sources: vec![] };
        let report = run(&config, &input).unwrap();
        assert!(matches!(persist(&report), Err(ReconError::Io(_))));
    }
}
