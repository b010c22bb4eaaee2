//! Hit-set aggregation over alignment-search result tables (DIAMOND/BLAST m8).
//!
//! A hit table is only consulted for its first column: the query identifier.
//! Presence of an identifier in any table means "not novel" with respect to
//! that database. Absent tables contribute nothing.
//!
//! # Examples
//! ```
//! use std::collections::HashSet;
//! use novatriage::hits::{novel_ids, union_hits};
//!
//! let uniref: HashSet<String> = ["p1".to_string()].into();
//! let human: HashSet<String> = ["p3".to_string()].into();
//! let all = union_hits([&uniref, &human]);
//! let novel = novel_ids(["p1", "p2", "p3"], &all);
//! assert_eq!(novel, vec!["p2".to_string()]);
//! ```
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::record::{ContaminationResult, Verdict};

/// Collect distinct query identifiers (first tab-delimited field) from a reader.
pub fn hit_ids_from_reader<R: Read>(reader: R) -> Result<HashSet<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut ids = HashSet::new();
    let mut rec = csv::ByteRecord::new();
    while rdr.read_byte_record(&mut rec)? {
        let Some(field) = rec.get(0) else { continue };
        match std::str::from_utf8(field).map(str::trim) {
            Ok(id) if !id.is_empty() => { ids.insert(id.to_string()); }
            Ok(_) => {}
            Err(_) => debug!(line = ?rec.position().map(|p| p.line()), "skipping hit row with a non-UTF-8 query id"),
        }
    }
    Ok(ids)
}

/// Load a hit table from disk. A missing file is the empty set, not an error.
pub fn load_hit_ids<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let p = path.as_ref();
    if !p.exists() {
        warn!(path = %p.display(), "hit table not found; treating as empty");
        return Ok(HashSet::new());
    }
    let ids = hit_ids_from_reader(std::fs::File::open(p)?)?;
    debug!(path = %p.display(), n = ids.len(), "loaded hit identifiers");
    Ok(ids)
}

/// Like [`load_hit_ids`] for an optional path; `None` is the empty set.
pub fn load_optional_hit_ids<P: AsRef<Path>>(path: Option<P>) -> Result<Option<HashSet<String>>> {
    path.map(load_hit_ids).transpose()
}

/// Union of any number of hit sets.
pub fn union_hits<'a, I>(sets: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a HashSet<String>>,
{
    let mut all = HashSet::new();
    for s in sets {
        all.extend(s.iter().cloned());
    }
    all
}

/// Candidates without a match in `hits`, in candidate order.
pub fn novel_ids<I, S>(candidates: I, hits: &HashSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for c in candidates {
        let id: &str = c.as_ref();
        if !hits.contains(id) {
            out.push(id.to_string());
        }
    }
    out
}

/// Human-contamination test: any human hit fails the run.
///
/// `None` means no human hit table was supplied and the test is skipped.
pub fn contamination_check(human_hits: Option<&HashSet<String>>) -> ContaminationResult {
    match human_hits {
        None => ContaminationResult { matches: 0, verdict: Verdict::Skipped },
        Some(h) => ContaminationResult {
            matches: h.len(),
            verdict: if h.is_empty() { Verdict::Pass } else { Verdict::Fail },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn set(ids: &[&str]) -> HashSet<String> { ids.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn first_column_only_and_distinct() {
        let m8 = "q1\tUniRef90_A\t98.1\t120\nq1\tUniRef90_B\t97.0\t100\nq2\tx\n\n# comment\nq3\n";
        let ids = hit_ids_from_reader(Cursor::new(m8)).unwrap();
        assert_eq!(ids, set(&["q1", "q2", "q3"]));
    }

    #[test]
    fn invalid_utf8_outside_the_query_column_is_tolerated() {
        let mut m8 = b"q1\tsubj\xff\xfe\t99.0\n".to_vec();
        m8.extend_from_slice(b"\xffbad\tx\nq2\ty\n");
        let ids = hit_ids_from_reader(Cursor::new(m8)).unwrap();
        assert_eq!(ids, set(&["q1", "q2"]));
    }

    #[test]
    fn missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ids = load_hit_ids(dir.path().join("nope.m8")).unwrap();
        assert!(ids.is_empty());
        assert!(load_optional_hit_ids::<&Path>(None).unwrap().is_none());
    }

    #[test]
    fn contamination_verdicts() {
        assert_eq!(contamination_check(None).verdict, Verdict::Skipped);
        assert_eq!(contamination_check(Some(&HashSet::new())).verdict, Verdict::Pass);
        let r = contamination_check(Some(&set(&["h1", "h2"])));
        assert_eq!((r.matches, r.verdict), (2, Verdict::Fail));
    }

    proptest! {
        #[test]
        fn union_is_order_independent_and_novel_is_disjoint(
            a in proptest::collection::hash_set("[a-e][0-9]", 0..8),
            b in proptest::collection::hash_set("[a-e][0-9]", 0..8),
            cands in proptest::collection::vec("[a-e][0-9]", 0..20),
        ) {
            let ab = union_hits([&a, &b]);
            let ba = union_hits([&b, &a]);
            prop_assert_eq!(&ab, &ba);
            prop_assert_eq!(union_hits([&ab, &ab]), ab.clone());
            let novel = novel_ids(&cands, &ab);
            prop_assert!(novel.iter().all(|id| !ab.contains(id)));
            let expected = cands.iter().filter(|c| !ab.contains(*c)).count();
            prop_assert_eq!(novel.len(), expected);
        }
    }
}
