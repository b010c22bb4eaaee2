//! Per-sequence heuristics that flag likely assembly or gene-prediction artifacts.
//!
//! Each check contributes an [`ArtifactIssue`]; a sequence with any issue is
//! labelled [`ArtifactLabel::PossiblyArtifact`].
use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::record::{percentage, ArtifactResult, Verdict};

/// Low-information residues checked for homopolymer runs.
pub const REPEAT_RESIDUES: &[u8] = b"AGLPQRS";
pub const MIN_REPEAT_RUN: usize = 5;
pub const HYDROPHOBIC: &[u8] = b"AILMFWV";
pub const CHARGED: &[u8] = b"DEKR";
pub const MAX_HYDROPHOBIC_FRACTION: f64 = 0.6;
pub const MAX_CHARGED_FRACTION: f64 = 0.4;
pub const MAX_SINGLE_RESIDUE_FRACTION: f64 = 0.3;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactLabel {
    LikelyReal,
    PossiblyArtifact,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactIssue {
    Repetitive,
    TooHydrophobic,
    TooCharged,
    LowComplexity,
    /// Zero-length sequence; no fraction is defined so it is flagged outright.
    Empty,
}

impl ArtifactIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactIssue::Repetitive => "repetitive",
            ArtifactIssue::TooHydrophobic => "too_hydrophobic",
            ArtifactIssue::TooCharged => "too_charged",
            ArtifactIssue::LowComplexity => "low_complexity",
            ArtifactIssue::Empty => "empty",
        }
    }
}

/// Longest run of a single repeated byte, restricted to `alphabet`.
fn has_run(seq: &[u8], alphabet: &[u8], min_run: usize) -> bool {
    let mut run = 0usize;
    let mut prev = None;
    for &b in seq {
        if Some(b) == prev { run += 1 } else { run = 1; prev = Some(b); }
        if run >= min_run && alphabet.contains(&b) {
            return true;
        }
    }
    false
}

fn fraction_in(seq: &[u8], set: &[u8]) -> f64 {
    if seq.is_empty() { return 0.0; }
    seq.iter().filter(|b| set.contains(b)).count() as f64 / seq.len() as f64
}

fn max_residue_fraction(seq: &[u8]) -> f64 {
    if seq.is_empty() { return 0.0; }
    let mut counts = [0usize; 256];
    for &b in seq { counts[b as usize] += 1; }
    let max = counts.iter().copied().max().unwrap_or(0);
    max as f64 / seq.len() as f64
}

/// Classify one residue string. The trailing stop symbol, if any, is part of
/// the length like every other character.
///
/// # Examples
/// ```
/// use novatriage::artifact::{classify, ArtifactIssue, ArtifactLabel};
/// let (label, issues) = classify("MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKVKALPDAQFEVVHSLAKWKRQTLGQHDFSAGEGLYTHMKALRPDEDRLSPLHSVYVDQWDWERVMGDGERQFSTLKSTVEAIWAGIKATEAAVSEEFGLAPFLPDQIHFVHSQELLSRYPDLDAKGRERAIAKDLGAVFLVGIGGKLSDGHRHDVRAPDYDDWUAIGLNE");
/// assert_eq!(label, ArtifactLabel::LikelyReal);
/// assert!(issues.is_empty());
/// ```
pub fn classify(residues: &str) -> (ArtifactLabel, Vec<ArtifactIssue>) {
    let seq = residues.as_bytes();
    let mut issues = Vec::new();
    if seq.is_empty() {
        issues.push(ArtifactIssue::Empty);
        return (ArtifactLabel::PossiblyArtifact, issues);
    }
    if has_run(seq, REPEAT_RESIDUES, MIN_REPEAT_RUN) {
        issues.push(ArtifactIssue::Repetitive);
    }
    if fraction_in(seq, HYDROPHOBIC) > MAX_HYDROPHOBIC_FRACTION {
        issues.push(ArtifactIssue::TooHydrophobic);
    }
    if fraction_in(seq, CHARGED) > MAX_CHARGED_FRACTION {
        issues.push(ArtifactIssue::TooCharged);
    }
    if max_residue_fraction(seq) > MAX_SINGLE_RESIDUE_FRACTION {
        issues.push(ArtifactIssue::LowComplexity);
    }
    let label = if issues.is_empty() { ArtifactLabel::LikelyReal } else { ArtifactLabel::PossiblyArtifact };
    (label, issues)
}

pub fn verdict_for(real_percentage: f64) -> Verdict {
    if real_percentage > 90.0 {
        Verdict::Pass
    } else if real_percentage > 80.0 {
        Verdict::Review
    } else {
        Verdict::Fail
    }
}

/// Classify a collection and aggregate the counts.
pub fn artifact_test(sequences: &[&str]) -> ArtifactResult {
    let labels: Vec<(ArtifactLabel, Vec<ArtifactIssue>)> = sequences.par_iter().map(|s| classify(s)).collect();

    let mut likely_real = 0usize;
    let mut possibly_artifact = 0usize;
    let mut hist: BTreeMap<ArtifactIssue, usize> = BTreeMap::new();
    for (label, issues) in labels {
        match label {
            ArtifactLabel::LikelyReal => likely_real += 1,
            ArtifactLabel::PossiblyArtifact => {
                possibly_artifact += 1;
                for i in issues {
                    *hist.entry(i).or_insert(0) += 1;
                }
            }
        }
    }
    let mut issues: Vec<(ArtifactIssue, usize)> = hist.into_iter().collect();
    issues.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let real_percentage = percentage(likely_real, likely_real + possibly_artifact);
    let verdict = verdict_for(real_percentage);
    info!(likely_real, possibly_artifact, real_percentage, %verdict, "artifact classification");
    ArtifactResult {
        likely_real,
        possibly_artifact,
        real_percentage,
        issues: issues.into_iter().map(|(i, c)| (i.as_str().to_string(), c)).collect(),
        verdict,
    }
}
