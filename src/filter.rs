//! Quality filter for novel protein candidates.
//!
//! Rules are checked in a fixed priority order and the **first** violated rule
//! is the reported reason, even when a sequence violates several:
//!
//! 1. `short`: fewer residues than the minimum length
//! 2. `no_start`: does not begin with methionine
//! 3. `internal_stop`: a `*` anywhere but the last position
//! 4. `partial`: the gene caller flagged the ORF as truncated
//!
//! # Examples
//! ```
//! use novatriage::filter::{FilterReason, QualityFilter};
//! use novatriage::record::ProteinRecord;
//!
//! let qf = QualityFilter::new(100);
//! let v = qf.evaluate(&ProteinRecord::from_header("p1", "MAAAAAKKKK*"));
//! assert!(!v.passed);
//! assert_eq!(v.reason, FilterReason::Short);
//! ```
use std::collections::{BTreeMap, HashSet};

use aho_corasick::AhoCorasick;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::hits;
use crate::record::{percentage, ProteinRecord};

/// Header markers Prodigal uses for ORFs truncated at the 5' end, the 3' end,
/// or both. `partial=00` marks a complete gene.
pub const PARTIAL_MARKERS: [&str; 3] = ["partial=10", "partial=01", "partial=11"];

/// Why a sequence was kept or rejected. Variant order is rule priority.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    Short,
    NoStart,
    InternalStop,
    Partial,
    Passed,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::Short => "short",
            FilterReason::NoStart => "no_start",
            FilterReason::InternalStop => "internal_stop",
            FilterReason::Partial => "partial",
            FilterReason::Passed => "passed",
        }
    }
}

/// Pass/fail decision for one sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FilterVerdict {
    pub passed: bool,
    pub reason: FilterReason,
}

impl FilterVerdict {
    fn from_reason(reason: FilterReason) -> Self {
        Self { passed: reason == FilterReason::Passed, reason }
    }
}

/// The four ordered quality rules.
pub struct QualityFilter {
    min_length: usize,
    partial: AhoCorasick,
}

impl QualityFilter {
    pub fn new(min_length: usize) -> Self {
        let partial = AhoCorasick::new(PARTIAL_MARKERS).expect("failed to build partial-marker automaton");
        Self { min_length, partial }
    }

    pub fn min_length(&self) -> usize { self.min_length }

    /// Apply the rules in priority order; the first violation wins.
    pub fn evaluate(&self, rec: &ProteinRecord) -> FilterVerdict {
        let seq = rec.residues.as_bytes();
        let reason = if seq.len() < self.min_length {
            FilterReason::Short
        } else if seq.first() != Some(&b'M') {
            FilterReason::NoStart
        } else if seq[..seq.len() - 1].contains(&b'*') {
            FilterReason::InternalStop
        } else if self.partial.is_match(&rec.header) {
            FilterReason::Partial
        } else {
            FilterReason::Passed
        };
        FilterVerdict::from_reason(reason)
    }

    /// Evaluate many sequences in parallel, preserving input order.
    pub fn evaluate_all(&self, records: &[&ProteinRecord]) -> Vec<FilterVerdict> {
        records.par_iter().map(|r| self.evaluate(r)).collect()
    }
}

impl Default for QualityFilter {
    fn default() -> Self { Self::new(crate::config::DEFAULT_MIN_LENGTH) }
}

/// Counts gathered while separating novel candidates and filtering them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterStats {
    pub total_proteins: usize,
    /// `(database label, distinct query ids with a hit)` in the order supplied.
    pub database_hits: Vec<(String, usize)>,
    /// Proteins with no hit in any database.
    pub novel: usize,
    /// Identifiers that passed every rule, in input order.
    pub passed: Vec<String>,
    /// Rejection histogram; each rejected sequence counted under one reason.
    pub rejected: BTreeMap<FilterReason, usize>,
}

impl FilterStats {
    /// `passed / novel * 100`, or 0 when there were no novel candidates.
    pub fn retention_rate(&self) -> f64 { percentage(self.passed.len(), self.novel) }

    /// Rejection reasons, most frequent first (ties in rule order).
    pub fn rejected_by_count(&self) -> Vec<(FilterReason, usize)> {
        let mut v: Vec<(FilterReason, usize)> = self.rejected.iter().map(|(r, c)| (*r, *c)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        v
    }
}

/// Separate novel proteins from database hits and apply the quality filter.
///
/// `databases` pairs a label (e.g. `"UniRef90"`) with that database's hit set.
/// Returns the statistics and the surviving records in input order.
pub fn triage_novel(
    proteins: &[ProteinRecord],
    databases: &[(String, HashSet<String>)],
    qf: &QualityFilter,
) -> (FilterStats, Vec<ProteinRecord>) {
    let all_hits = hits::union_hits(databases.iter().map(|(_, s)| s));
    let novel: Vec<&ProteinRecord> = proteins.iter().filter(|p| !all_hits.contains(&p.id)).collect();
    let verdicts = qf.evaluate_all(&novel);

    let mut stats = FilterStats {
        total_proteins: proteins.len(),
        database_hits: databases.iter().map(|(name, s)| (name.clone(), s.len())).collect(),
        novel: novel.len(),
        ..Default::default()
    };
    let mut kept = Vec::new();
    for (rec, v) in novel.iter().zip(verdicts) {
        if v.passed {
            stats.passed.push(rec.id.clone());
            kept.push((*rec).clone());
        } else {
            *stats.rejected.entry(v.reason).or_insert(0) += 1;
        }
    }
    info!(
        total = stats.total_proteins,
        novel = stats.novel,
        passed = stats.passed.len(),
        retention_pct = stats.retention_rate(),
        "quality filter complete"
    );
    (stats, kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(header: &str, seq: &str) -> ProteinRecord { ProteinRecord::from_header(header, seq) }

    fn long(prefix: &str, n: usize) -> String {
        let mut s = prefix.to_string();
        while s.len() < n { s.push('K'); }
        s
    }

    #[test]
    fn length_has_priority_over_start() {
        let v = QualityFilter::new(100).evaluate(&rec("p", "MAAAAAKKKK*"));
        assert_eq!(v, FilterVerdict { passed: false, reason: FilterReason::Short });
        let v = QualityFilter::new(100).evaluate(&rec("p partial=11", "A*A"));
        assert_eq!(v.reason, FilterReason::Short);
    }

    #[test]
    fn each_rule_in_order() {
        let qf = QualityFilter::new(10);
        assert_eq!(qf.evaluate(&rec("p partial=01", &long("A*", 12))).reason, FilterReason::NoStart);
        assert_eq!(qf.evaluate(&rec("p partial=01", &long("M*", 12))).reason, FilterReason::InternalStop);
        assert_eq!(qf.evaluate(&rec("p # ID=1_1;partial=01;start_type=ATG", &long("M", 12))).reason, FilterReason::Partial);
        assert_eq!(qf.evaluate(&rec("p partial=10", &long("M", 12))).reason, FilterReason::Partial);
        let ok = qf.evaluate(&rec("p # ID=1_1;partial=00", &format!("{}*", long("M", 12))));
        assert_eq!(ok, FilterVerdict { passed: true, reason: FilterReason::Passed });
    }

    #[test]
    fn trailing_stop_is_allowed_but_doubled_is_not() {
        let qf = QualityFilter::new(1);
        assert!(qf.evaluate(&rec("p", "MK*")).passed);
        assert_eq!(qf.evaluate(&rec("p", "MK**")).reason, FilterReason::InternalStop);
    }

    #[test]
    fn empty_sequence_with_zero_minimum_has_no_start() {
        let qf = QualityFilter::new(0);
        assert_eq!(qf.evaluate(&rec("p", "")).reason, FilterReason::NoStart);
    }

    #[test]
    fn triage_counts_each_rejection_once() {
        let proteins = vec![
            rec("a", &long("M", 120)),
            rec("b", "MKK"),
            rec("c partial=11", &long("M", 120)),
            rec("d", &long("M", 120)),
            rec("e", &long("Q", 120)),
        ];
        let dbs = vec![("UniRef90".to_string(), ["d".to_string()].into())];
        let (stats, kept) = triage_novel(&proteins, &dbs, &QualityFilter::new(100));
        assert_eq!(stats.total_proteins, 5);
        assert_eq!(stats.novel, 4);
        assert_eq!(stats.passed, vec!["a".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(stats.rejected.values().sum::<usize>(), 3);
        assert_eq!(stats.rejected[&FilterReason::Short], 1);
        assert_eq!(stats.database_hits, vec![("UniRef90".to_string(), 1)]);
        assert_eq!(stats.retention_rate(), 25.0);
        assert_eq!(stats.rejected_by_count()[0].0, FilterReason::Short);
    }

    #[test]
    fn retention_is_zero_without_novel_candidates() {
        let (stats, kept) = triage_novel(&[], &[], &QualityFilter::default());
        assert_eq!(stats.retention_rate(), 0.0);
        assert!(kept.is_empty());
    }

    proptest! {
        #[test]
        fn exactly_one_reason_and_passes_break_no_rule(
            residues in "M?[ACDEFGHIKLMNPQRSTVWY*]{0,30}",
            partial in prop_oneof![Just("00"), Just("01"), Just("10"), Just("11")],
            min_length in 0usize..20,
        ) {
            let header = format!("p # 1 # 90 # 1 # ID=1_1;partial={partial};start_type=ATG");
            let v = QualityFilter::new(min_length).evaluate(&rec(&header, &residues));
            let seq = residues.as_bytes();
            let short = seq.len() < min_length;
            let no_start = seq.first() != Some(&b'M');
            let internal_stop = !seq.is_empty() && seq[..seq.len() - 1].contains(&b'*');
            let truncated = partial != "00";
            let expected = if short {
                FilterReason::Short
            } else if no_start {
                FilterReason::NoStart
            } else if internal_stop {
                FilterReason::InternalStop
            } else if truncated {
                FilterReason::Partial
            } else {
                FilterReason::Passed
            };
            prop_assert_eq!(v.reason, expected);
            prop_assert_eq!(v.passed, v.reason == FilterReason::Passed);
            if v.passed {
                prop_assert!(!short && !no_start && !internal_stop && !truncated);
            }
        }
    }
}
