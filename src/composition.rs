//! Amino-acid composition deviation test.
//!
//! Pools every residue of the collection and compares the observed
//! frequencies of the reference residues to a table of expected frequencies
//! with a chi-squared style statistic. Non-standard symbols (`X`, `*`, `U`, ...) are
//! ignored entirely.
use tracing::info;

use crate::record::{CompositionResult, ResidueFrequency, Verdict};

/// Expected single-residue frequencies (UniProt average), alphabetical.
/// Rounded to three decimals, so the table sums to 1.002.
pub const EXPECTED_AA_FREQ: [(u8, f64); 20] = [
    (b'A', 0.083), (b'C', 0.014), (b'D', 0.055), (b'E', 0.068), (b'F', 0.039),
    (b'G', 0.071), (b'H', 0.023), (b'I', 0.060), (b'K', 0.058), (b'L', 0.097),
    (b'M', 0.024), (b'N', 0.041), (b'P', 0.047), (b'Q', 0.039), (b'R', 0.055),
    (b'S', 0.066), (b'T', 0.053), (b'V', 0.069), (b'W', 0.011), (b'Y', 0.029),
];

/// Expected frequency per residue, e.g. [`EXPECTED_AA_FREQ`].
pub type ReferenceTable = [(u8, f64)];

pub const PASS_BELOW: f64 = 0.3;
pub const REVIEW_BELOW: f64 = 0.5;

/// Raw residue counts, indexed by uppercase byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResidueCounts {
    counts: [usize; 256],
}

impl Default for ResidueCounts {
    fn default() -> Self { Self { counts: [0; 256] } }
}

impl ResidueCounts {
    pub fn add(&mut self, residues: &[u8]) {
        for &b in residues {
            self.counts[b.to_ascii_uppercase() as usize] += 1;
        }
    }

    pub fn get(&self, residue: u8) -> usize { self.counts[residue as usize] }

    /// Residues belonging to the reference alphabet.
    pub fn reference_total(&self, reference: &ReferenceTable) -> usize {
        reference.iter().map(|(aa, _)| self.get(*aa)).sum()
    }

    /// Frequency of `residue` within `total`; 0 when nothing was counted.
    pub fn frequency(&self, residue: u8, total: usize) -> f64 {
        if total == 0 { 0.0 } else { self.get(residue) as f64 / total as f64 }
    }
}

/// Count residues over a collection of sequences.
pub fn count_residues<'a, I>(sequences: I) -> ResidueCounts
where
    I: IntoIterator<Item = &'a str>,
{
    let mut c = ResidueCounts::default();
    for s in sequences {
        c.add(s.as_bytes());
    }
    c
}

/// Σ (observed − expected)² / expected over the reference alphabet.
pub fn chi_squared(counts: &ResidueCounts, reference: &ReferenceTable) -> f64 {
    let total = counts.reference_total(reference);
    reference
        .iter()
        .map(|(aa, expected)| {
            let d = counts.frequency(*aa, total) - expected;
            if *expected > 0.0 { d * d / expected } else { 0.0 }
        })
        .sum()
}

pub fn verdict_for(chi_sq: f64) -> Verdict {
    if chi_sq < PASS_BELOW {
        Verdict::Pass
    } else if chi_sq < REVIEW_BELOW {
        Verdict::Review
    } else {
        Verdict::Fail
    }
}

/// Run the composition test over a collection of residue strings.
pub fn composition_test<'a, I>(sequences: I, reference: &ReferenceTable) -> CompositionResult
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = count_residues(sequences);
    let total = counts.reference_total(reference);
    let chi = chi_squared(&counts, reference);
    let frequencies = reference
        .iter()
        .map(|(aa, expected)| ResidueFrequency { residue: *aa as char, expected: *expected, observed: counts.frequency(*aa, total) })
        .collect();
    let verdict = verdict_for(chi);
    info!(chi_squared = chi, %verdict, "amino-acid composition test");
    CompositionResult { chi_squared: chi, total_residues: total, frequencies, verdict }
}
