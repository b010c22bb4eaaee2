//! Markdown renderers for filter statistics and the verification report.
use std::fmt::Write as _;

use crate::filter::FilterStats;
use crate::verify::VerificationReport;

/// Local wall-clock timestamp stamped into every report.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `1234567` -> `"1,234,567"`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn filter_stats_markdown(stats: &FilterStats) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "# Quality Filtering Statistics\n");
    let _ = writeln!(s, "Total proteins: {}", thousands(stats.total_proteins));
    for (db, n) in &stats.database_hits {
        let _ = writeln!(s, "{db} hits: {}", thousands(*n));
    }
    let _ = writeln!(s, "Novel (no hits): {}", thousands(stats.novel));
    let _ = writeln!(s, "Quality filtered: {}", thousands(stats.passed.len()));
    let _ = writeln!(s, "Retention rate: {:.1}%\n", stats.retention_rate());
    let _ = writeln!(s, "Rejected by reason:");
    for (reason, n) in stats.rejected_by_count() {
        let _ = writeln!(s, "  {}: {}", reason.as_str(), thousands(n));
    }
    s
}

pub fn verification_markdown(report: &VerificationReport, generated: &str) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "# Verification Report\n");
    let _ = writeln!(s, "Generated: {generated}\n");
    let _ = writeln!(s, "## Summary\n");
    let _ = writeln!(s, "| Metric | Value |\n|--------|-------|");
    let _ = writeln!(s, "| Total novel proteins | {} |", thousands(report.candidates));
    let _ = writeln!(s, "| Overall verdict | {} |\n", report.overall());

    let _ = writeln!(s, "## Verification Tests\n");
    let _ = writeln!(s, "| Test | Result | Verdict |\n|------|--------|---------|");
    let h = &report.human_contamination;
    let _ = writeln!(s, "| human_contamination | {} matches | {} |", h.matches, h.verdict);
    let c = &report.aa_composition;
    let _ = writeln!(s, "| aa_composition | Chi-sq = {:.3} | {} |", c.chi_squared, c.verdict);
    let a = &report.protein_classification;
    let _ = writeln!(s, "| protein_classification | {:.1}% likely real | {} |", a.real_percentage, a.verdict);
    let g = &report.genomic_context;
    let _ = writeln!(s, "| genomic_context | {} isolated | {} |", g.isolated, g.verdict);

    if !a.issues.is_empty() {
        let _ = writeln!(s, "\n### Artifact issues\n");
        let _ = writeln!(s, "| Issue | Sequences |\n|-------|-----------|");
        for (issue, n) in &a.issues {
            let _ = writeln!(s, "| {issue} | {n} |");
        }
    }

    let _ = writeln!(s, "\n## Classification (Preliminary)\n");
    let _ = writeln!(s, "| Type | Description | Count |\n|------|-------------|-------|");
    for (t, n) in report.classifications.counts() {
        let _ = writeln!(s, "| {} | {} | {n} |", t.key(), t.description());
    }

    let (n_remote, n_structure) = report
        .manual_samples
        .as_ref()
        .map_or((0, 0), |m| (m.remote_homology_samples.len(), m.structure_samples.len()));
    let _ = writeln!(s, "\n## Manual Verification Required\n");
    let _ = writeln!(s, "- [ ] HHblits remote homology ({n_remote} samples)");
    let _ = writeln!(s, "- [ ] Foldseek structural similarity ({n_structure} samples)");
    let _ = writeln!(s, "- [ ] NCBI nr spot check (10 samples)");
    let _ = writeln!(s, "- [ ] Pfam domain search (full dataset)");
    let _ = writeln!(s, "\n## Notes\n");
    let _ = writeln!(s, "Update this report after completing manual verification steps.");
    s
}
