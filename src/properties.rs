//! Basic physico-chemical properties for the final results table.
//!
//! Approximations only: average residue masses minus one water per peptide
//! bond, Kyte–Doolittle GRAVY, and a crude charge at pH 7.
use serde::{Deserialize, Serialize};

/// Mass (Da) used for residues outside the standard alphabet.
pub const DEFAULT_RESIDUE_MASS: f64 = 110.0;
pub const WATER_MASS: f64 = 18.0;

fn residue_mass(aa: u8) -> f64 {
    match aa {
        b'A' => 89.0, b'R' => 174.0, b'N' => 132.0, b'D' => 133.0, b'C' => 121.0,
        b'Q' => 146.0, b'E' => 147.0, b'G' => 75.0, b'H' => 155.0, b'I' => 131.0,
        b'L' => 131.0, b'K' => 146.0, b'M' => 149.0, b'F' => 165.0, b'P' => 115.0,
        b'S' => 105.0, b'T' => 119.0, b'W' => 204.0, b'Y' => 181.0, b'V' => 117.0,
        _ => DEFAULT_RESIDUE_MASS,
    }
}

/// Kyte–Doolittle hydropathy; 0 for non-standard symbols.
fn hydropathy(aa: u8) -> f64 {
    match aa {
        b'A' => 1.8, b'R' => -4.5, b'N' => -3.5, b'D' => -3.5, b'C' => 2.5,
        b'Q' => -3.5, b'E' => -3.5, b'G' => -0.4, b'H' => -3.2, b'I' => 4.5,
        b'L' => 3.8, b'K' => -3.9, b'M' => 1.9, b'F' => 2.8, b'P' => -1.6,
        b'S' => -0.8, b'T' => -0.7, b'W' => -0.9, b'Y' => -1.3, b'V' => 4.2,
        _ => 0.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProteinProperties {
    pub length: usize,
    /// Molecular weight in kDa, two decimals.
    pub mw_kda: f64,
    /// Grand average of hydropathy, three decimals.
    pub gravy: f64,
    /// `(R + K + 0.1·H) − (D + E)`, one decimal.
    pub net_charge: f64,
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

pub fn properties(residues: &str) -> ProteinProperties {
    let seq = residues.as_bytes();
    let length = seq.len();
    let bonds = length.saturating_sub(1) as f64;
    let mw = seq.iter().map(|&b| residue_mass(b)).sum::<f64>() - bonds * WATER_MASS;
    let gravy = if length == 0 { 0.0 } else { seq.iter().map(|&b| hydropathy(b)).sum::<f64>() / length as f64 };
    let count = |c: u8| seq.iter().filter(|&&b| b == c).count() as f64;
    let net = count(b'R') + count(b'K') + 0.1 * count(b'H') - count(b'D') - count(b'E');
    ProteinProperties {
        length,
        mw_kda: round_to(mw / 1000.0, 2),
        gravy: round_to(gravy, 3),
        net_charge: round_to(net, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_is_all_zero() {
        let p = properties("");
        assert_eq!(p, ProteinProperties { length: 0, mw_kda: 0.0, gravy: 0.0, net_charge: 0.0 });
    }

    #[test]
    fn single_residue_weight() {
        let p = properties("W");
        assert_eq!(p.mw_kda, 0.2);
        assert_eq!(p.gravy, -0.9);
    }

    #[test]
    fn dipeptide_loses_one_water() {
        // 89 + 75 - 18 = 146 Da
        assert_eq!(properties("AG").mw_kda, 0.15);
        assert_eq!(properties("GX").mw_kda, round_to((75.0 + 110.0 - 18.0) / 1000.0, 2));
    }

    #[test]
    fn net_charge_counts_histidine_weakly() {
        assert_eq!(properties("RKHDD").net_charge, 0.1);
        assert_eq!(properties("EEE").net_charge, -3.0);
    }
}
