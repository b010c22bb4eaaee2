//! Core types for **protein records**, **verdicts** and **verification results**.
//!
//! This module holds the data model shared across the crate. Records are
//! read-only for the duration of a run; everything else is derived once and
//! handed to reporting collaborators (JSON, Markdown, TSV).
use core::fmt;

use serde::{Deserialize, Serialize};

/// A predicted protein as read from a FASTA file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinRecord {
    /// First whitespace-delimited token of the header (e.g. `"k141_7_3"`).
    pub id: String,
    /// Amino-acid residues, uppercase, possibly ending in the stop symbol `*`.
    pub residues: String,
    /// Full raw header line without the leading `>`; carries gene-caller flags
    /// such as Prodigal's `partial=01`.
    pub header: String,
}

impl ProteinRecord {
    /// Build a record from a raw header line and its residues.
    ///
    /// The identifier is the first whitespace-delimited token of `header`.
    ///
    /// # Examples
    /// ```
    /// let r = novatriage::record::ProteinRecord::from_header("k1_1 # 2 # 301 # 1 # partial=00", "MKV");
    /// assert_eq!(r.id, "k1_1");
    /// assert!(r.header.contains("partial=00"));
    /// ```
    pub fn from_header(header: &str, residues: &str) -> Self {
        let header = header.trim();
        let id = header.split_whitespace().next().unwrap_or_default().to_string();
        Self { id, residues: residues.trim().to_ascii_uppercase(), header: header.to_string() }
    }

    /// Number of residues (the trailing stop symbol, if present, counts).
    pub fn len(&self) -> usize { self.residues.len() }

    pub fn is_empty(&self) -> bool { self.residues.is_empty() }
}

/// Outcome of a verification test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Review,
    Fail,
    /// The test could not run because an optional input was not supplied.
    Skipped,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Review => "REVIEW",
            Verdict::Fail => "FAIL",
            Verdict::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Result of the human-contamination test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContaminationResult {
    /// Distinct query identifiers with a human hit.
    pub matches: usize,
    pub verdict: Verdict,
}

/// Observed vs expected frequency of one reference residue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResidueFrequency {
    pub residue: char,
    pub expected: f64,
    pub observed: f64,
}

/// Result of the amino-acid composition test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompositionResult {
    pub chi_squared: f64,
    /// Residues counted towards the statistic (reference alphabet only).
    pub total_residues: usize,
    /// One entry per reference residue, alphabetical.
    pub frequencies: Vec<ResidueFrequency>,
    pub verdict: Verdict,
}

/// Aggregated result of the artifact heuristics over a collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactResult {
    pub likely_real: usize,
    pub possibly_artifact: usize,
    pub real_percentage: f64,
    /// Issue name -> number of flagged sequences carrying it, most frequent first.
    pub issues: Vec<(String, usize)>,
    pub verdict: Verdict,
}

/// Aggregated result of the genomic-context test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextResult {
    pub isolated: usize,
    pub contextual: usize,
    pub isolated_percentage: f64,
    /// Isolated identifiers in coordinate-table order.
    pub isolated_ids: Vec<String>,
    pub verdict: Verdict,
}

impl ContextResult {
    /// Result used when no coordinate table is available.
    pub fn skipped() -> Self {
        Self { isolated: 0, contextual: 0, isolated_percentage: 0.0, isolated_ids: Vec::new(), verdict: Verdict::Skipped }
    }
}

/// Percentage `num / den * 100`, or `0.0` when `den` is zero.
#[inline]
pub fn percentage(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 * 100.0 }
}
