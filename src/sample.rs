//! Reproducible sample batches for manual verification.
//!
//! The crate never talks to web services. It only picks which candidates a
//! researcher should submit to a remote-homology search (HHpred/HHblits) and a
//! structure search (ESMFold + Foldseek), and renders instructions for them.
//! Given the same seed and the same input order, the same ids are drawn.
use std::fmt::Write as _;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::record::ProteinRecord;
use crate::seqio::FASTA_LINE_WIDTH;

/// Structure predictors struggle above this length.
pub const STRUCTURE_LENGTH_WARNING: usize = 400;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSamples {
    pub remote_homology_samples: Vec<String>,
    pub structure_samples: Vec<String>,
}

/// Draw `n` distinct records (or all of them when fewer) in sampling order.
pub fn draw<'a>(rng: &mut StdRng, records: &'a [ProteinRecord], n: usize) -> Vec<&'a ProteinRecord> {
    let n = n.min(records.len());
    rand::seq::index::sample(rng, records.len(), n).into_iter().map(|i| &records[i]).collect()
}

/// Draw both batches from one generator seeded with `seed`.
///
/// The remote-homology batch is drawn first, then the structure batch; the
/// two batches may overlap.
pub fn generate(records: &[ProteinRecord], n_remote: usize, n_structure: usize, seed: u64) -> (ManualSamples, String) {
    let mut rng = StdRng::seed_from_u64(seed);
    let remote = draw(&mut rng, records, n_remote);
    let structure = draw(&mut rng, records, n_structure);

    let mut text = String::new();
    let _ = writeln!(text, "--- Remote Homology Samples (n={}) ---", remote.len());
    let _ = writeln!(text, "Instructions:");
    let _ = writeln!(text, "1. Go to: https://toolkit.tuebingen.mpg.de/tools/hhpred");
    let _ = writeln!(text, "2. Database: PDB_mmCIF70, UniRef30");
    let _ = writeln!(text, "3. Record: Match found (Type C) or No match (potentially Type A)");
    let _ = writeln!(text);
    for (i, r) in remote.iter().enumerate() {
        render_one(&mut text, "Remote Homology", i + 1, remote.len(), r, false);
    }

    let _ = writeln!(text, "--- Structural Samples (n={}) ---", structure.len());
    let _ = writeln!(text, "Instructions:");
    let _ = writeln!(text, "1. Predict structure: https://esmatlas.com/resources?action=fold");
    let _ = writeln!(text, "2. Search: https://search.foldseek.com/search");
    let _ = writeln!(text, "3. Record: Structure match (Type B) or No match (potentially Type A)");
    let _ = writeln!(text);
    for (i, r) in structure.iter().enumerate() {
        render_one(&mut text, "Structure", i + 1, structure.len(), r, true);
    }

    let samples = ManualSamples {
        remote_homology_samples: remote.iter().map(|r| r.id.clone()).collect(),
        structure_samples: structure.iter().map(|r| r.id.clone()).collect(),
    };
    (samples, text)
}

fn render_one(out: &mut String, label: &str, i: usize, n: usize, r: &ProteinRecord, warn_long: bool) {
    let _ = writeln!(out, "=== {label} Sample {i}/{n} ===");
    let _ = writeln!(out, "ID: {}", r.id);
    let _ = writeln!(out, "Length: {} aa", r.len());
    if warn_long && r.len() > STRUCTURE_LENGTH_WARNING {
        let _ = writeln!(out, "WARNING: >{STRUCTURE_LENGTH_WARNING}aa, may need to truncate for structure prediction");
    }
    let _ = writeln!(out, "Sequence:");
    for chunk in r.residues.as_bytes().chunks(FASTA_LINE_WIDTH) {
        let _ = writeln!(out, "{}", String::from_utf8_lossy(chunk));
    }
    let _ = writeln!(out);
}
