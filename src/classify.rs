//! Type A–E classification of novel candidates.
//!
//! | Type | Meaning | Evidence |
//! |------|---------|----------|
//! | E | possible artifact | isolated ORF (genomic context) |
//! | B | structure known | structure-search match |
//! | D | domain hybrid | conserved-domain match |
//! | C | remote homolog | remote-homology match |
//! | A | completely novel | none of the above |
//!
//! Exclusion is asymmetric. Type D excludes Type E; Type C excludes Types E
//! and D; Type B excludes **only** Type E, so a structure match is never
//! displaced by a domain or homology match. To keep the buckets disjoint this
//! makes B the first bucket checked after E. Do not change this precedence
//! without product confirmation.
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum NovelType {
    #[serde(rename = "type_a_completely_novel")]
    A,
    #[serde(rename = "type_b_structure_known")]
    B,
    #[serde(rename = "type_c_remote_homolog")]
    C,
    #[serde(rename = "type_d_domain_hybrid")]
    D,
    #[serde(rename = "type_e_artifact")]
    E,
}

impl NovelType {
    pub const ALL: [NovelType; 5] = [NovelType::A, NovelType::B, NovelType::C, NovelType::D, NovelType::E];

    /// Stable key used in JSON dumps.
    pub fn key(&self) -> &'static str {
        match self {
            NovelType::A => "type_a_completely_novel",
            NovelType::B => "type_b_structure_known",
            NovelType::C => "type_c_remote_homolog",
            NovelType::D => "type_d_domain_hybrid",
            NovelType::E => "type_e_artifact",
        }
    }

    /// Human-readable label for tables, e.g. `"Type B Structure Known"`.
    pub fn label(&self) -> &'static str {
        match self {
            NovelType::A => "Type A Completely Novel",
            NovelType::B => "Type B Structure Known",
            NovelType::C => "Type C Remote Homolog",
            NovelType::D => "Type D Domain Hybrid",
            NovelType::E => "Type E Artifact",
        }
    }

    /// Evidence behind the category, for reports.
    pub fn description(&self) -> &'static str {
        match self {
            NovelType::A => "No sequence or structure homology",
            NovelType::B => "Novel sequence, known fold",
            NovelType::C => "Remote homology match",
            NovelType::D => "Known conserved domains",
            NovelType::E => "Possible assembly artifact",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

/// External evidence consulted by the classifier. Absent sets contribute nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchSets<'a> {
    pub isolated: Option<&'a HashSet<String>>,
    pub domain: Option<&'a HashSet<String>>,
    pub remote_homolog: Option<&'a HashSet<String>>,
    pub structure: Option<&'a HashSet<String>>,
}

fn member(set: Option<&HashSet<String>>, id: &str) -> bool {
    set.is_some_and(|s| s.contains(id))
}

impl MatchSets<'_> {
    /// Category for one candidate.
    pub fn type_of(&self, id: &str) -> NovelType {
        if member(self.isolated, id) {
            NovelType::E
        } else if member(self.structure, id) {
            NovelType::B
        } else if member(self.domain, id) {
            NovelType::D
        } else if member(self.remote_homolog, id) {
            NovelType::C
        } else {
            NovelType::A
        }
    }
}

/// Five disjoint buckets whose union is the candidate set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    buckets: BTreeMap<NovelType, Vec<String>>,
}

impl Partition {
    /// Partition `candidates` (duplicates ignored); buckets keep input order.
    /// Match-set members that are not candidates are ignored.
    pub fn classify<I, S>(candidates: I, sets: &MatchSets<'_>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buckets: BTreeMap<NovelType, Vec<String>> = NovelType::ALL.into_iter().map(|t| (t, Vec::new())).collect();
        let mut seen = HashSet::new();
        for c in candidates {
            let id: &str = c.as_ref();
            if !seen.insert(id.to_string()) {
                continue;
            }
            buckets.entry(sets.type_of(id)).or_default().push(id.to_string());
        }
        let p = Self { buckets };
        info!(
            a = p.ids(NovelType::A).len(),
            b = p.ids(NovelType::B).len(),
            c = p.ids(NovelType::C).len(),
            d = p.ids(NovelType::D).len(),
            e = p.ids(NovelType::E).len(),
            "novel protein classification"
        );
        p
    }

    pub fn ids(&self, t: NovelType) -> &[String] {
        self.buckets.get(&t).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bucket holding `id`, if it was classified.
    pub fn type_of(&self, id: &str) -> Option<NovelType> {
        self.buckets.iter().find(|(_, v)| v.iter().any(|x| x == id)).map(|(t, _)| *t)
    }

    /// `(type, count)` for all five types, A first.
    pub fn counts(&self) -> Vec<(NovelType, usize)> {
        NovelType::ALL.into_iter().map(|t| (t, self.ids(t).len())).collect()
    }

    pub fn total(&self) -> usize { self.buckets.values().map(Vec::len).sum() }

    /// Id → type lookup table, for joining with per-protein tables.
    pub fn lookup(&self) -> std::collections::HashMap<&str, NovelType> {
        self.buckets.iter().flat_map(|(t, v)| v.iter().map(move |id| (id.as_str(), *t))).collect()
    }

    /// Reload a partition from a verification JSON dump, reading the
    /// `classifications` object. Unknown keys are ignored; missing keys are empty.
    pub fn from_json_value(v: &serde_json::Value) -> Self {
        let mut buckets: BTreeMap<NovelType, Vec<String>> = NovelType::ALL.into_iter().map(|t| (t, Vec::new())).collect();
        let obj = v.get("classifications").unwrap_or(v);
        if let Some(map) = obj.as_object() {
            for (k, ids) in map {
                let Some(t) = NovelType::from_key(k) else { continue };
                if let Some(arr) = ids.as_array() {
                    let bucket = buckets.entry(t).or_default();
                    bucket.extend(arr.iter().filter_map(|x| x.as_str()).map(str::to_string));
                }
            }
        }
        Self { buckets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(ids: &[&str]) -> HashSet<String> { ids.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn structure_beats_domain_when_not_isolated() {
        let structure = set(&["X"]);
        let domain = set(&["X", "Y"]);
        let sets = MatchSets { structure: Some(&structure), domain: Some(&domain), ..Default::default() };
        let p = Partition::classify(["X", "Y", "Z"], &sets);
        assert_eq!(p.ids(NovelType::B), ["X".to_string()]);
        assert_eq!(p.ids(NovelType::D), ["Y".to_string()]);
        assert_eq!(p.ids(NovelType::A), ["Z".to_string()]);
    }

    #[test]
    fn isolation_wins_over_everything() {
        let all = set(&["X"]);
        let sets = MatchSets { isolated: Some(&all), domain: Some(&all), remote_homolog: Some(&all), structure: Some(&all) };
        assert_eq!(sets.type_of("X"), NovelType::E);
    }

    #[test]
    fn domain_excludes_homolog() {
        let d = set(&["X"]);
        let h = set(&["X", "W"]);
        let sets = MatchSets { domain: Some(&d), remote_homolog: Some(&h), ..Default::default() };
        assert_eq!(sets.type_of("X"), NovelType::D);
        assert_eq!(sets.type_of("W"), NovelType::C);
    }

    #[test]
    fn absent_sets_leave_everything_type_a() {
        let p = Partition::classify(["a", "b", "a"], &MatchSets::default());
        assert_eq!(p.ids(NovelType::A).len(), 2);
        assert_eq!(p.total(), 2);
        assert_eq!(p.counts().len(), 5);
    }

    #[test]
    fn non_candidate_matches_are_ignored() {
        let s = set(&["ghost"]);
        let p = Partition::classify(["a"], &MatchSets { structure: Some(&s), ..Default::default() });
        assert!(p.ids(NovelType::B).is_empty());
        assert_eq!(p.type_of("a"), Some(NovelType::A));
        assert_eq!(p.type_of("ghost"), None);
    }

    #[test]
    fn json_round_trip_uses_category_keys() {
        let iso = set(&["e1"]);
        let p = Partition::classify(["a1", "e1"], &MatchSets { isolated: Some(&iso), ..Default::default() });
        let v = serde_json::json!({ "classifications": serde_json::to_value(&p).unwrap() });
        assert!(v["classifications"]["type_e_artifact"].as_array().is_some());
        assert_eq!(Partition::from_json_value(&v), p);
    }

    proptest! {
        #[test]
        fn buckets_are_disjoint_and_cover_candidates(
            cands in proptest::collection::hash_set("[a-h][0-9]", 0..40),
            iso in proptest::collection::hash_set("[a-h][0-9]", 0..10),
            dom in proptest::collection::hash_set("[a-h][0-9]", 0..10),
            hom in proptest::collection::hash_set("[a-h][0-9]", 0..10),
            st in proptest::collection::hash_set("[a-h][0-9]", 0..10),
        ) {
            let sets = MatchSets { isolated: Some(&iso), domain: Some(&dom), remote_homolog: Some(&hom), structure: Some(&st) };
            let ordered: Vec<&String> = cands.iter().collect();
            let p = Partition::classify(&ordered, &sets);
            let mut union = HashSet::new();
            for t in NovelType::ALL {
                for id in p.ids(t) {
                    prop_assert!(union.insert(id.clone()), "{} appears twice", id);
                }
            }
            prop_assert_eq!(union, cands);
        }
    }
}
