//! Genomic-context analysis over gene-caller coordinate tables (GFF3).
//!
//! A candidate is *isolated* when it is the only coding locus on its contig,
//! or when all coding loci on the contig together span fewer than
//! [`DEFAULT_MIN_CONTEXT_SPAN`](crate::config::DEFAULT_MIN_CONTEXT_SPAN)
//! bases. Isolated ORFs carry less supporting evidence and are the Type E
//! pool for classification.
//!
//! The analysis is two-phase: every locus is grouped by contig first
//! ([`ContigGroups::from_loci`]), and only then are candidates labelled,
//! because occupancy counts *all* coding loci on a contig, not only
//! candidates.
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::record::{percentage, ContextResult, Verdict};

/// One coding feature, 1-based inclusive coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicLocus {
    pub contig: String,
    pub start: u64,
    pub end: u64,
    pub id: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationBasis {
    /// The only coding locus on its contig.
    SoleOrf,
    /// Several loci, but their combined span is below the minimum.
    ShortContig,
    Contextual,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolationVerdict {
    pub id: String,
    pub isolated: bool,
    pub basis: IsolationBasis,
}

/// Value of the `ID` key in a GFF attribute column (`ID=1_7;partial=00;...`).
fn attribute_id(attrs: &str) -> Option<&str> {
    attrs
        .split(';')
        .filter_map(|kv| kv.trim().split_once('='))
        .find(|(k, _)| *k == "ID")
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// Parse one coordinate row. Returns `None` for comments, other feature
/// types, and malformed rows (fewer than 9 fields, non-integer or inverted
/// coordinates, missing `ID=`).
pub fn parse_locus(line: &str, feature: &str) -> Option<GenomicLocus> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.starts_with('#') || line.trim().is_empty() {
        return None;
    }
    let f: Vec<&str> = line.split('\t').collect();
    if f.len() < 9 || f[2] != feature {
        return None;
    }
    let start: u64 = f[3].trim().parse().ok()?;
    let end: u64 = f[4].trim().parse().ok()?;
    if start > end {
        return None;
    }
    let id = attribute_id(f[8])?;
    Some(GenomicLocus { contig: f[0].to_string(), start, end, id: id.to_string() })
}

/// All coding loci grouped by contig, contigs in order of first appearance.
#[derive(Clone, Debug, Default)]
pub struct ContigGroups {
    contigs: Vec<(String, Vec<GenomicLocus>)>,
    index: HashMap<String, usize>,
}

impl ContigGroups {
    pub fn from_loci<I: IntoIterator<Item = GenomicLocus>>(loci: I) -> Self {
        let mut g = Self::default();
        for l in loci {
            let slot = match g.index.get(&l.contig) {
                Some(&i) => i,
                None => {
                    g.index.insert(l.contig.clone(), g.contigs.len());
                    g.contigs.push((l.contig.clone(), Vec::new()));
                    g.contigs.len() - 1
                }
            };
            g.contigs[slot].1.push(l);
        }
        g
    }

    /// Parse a coordinate table, skipping rows that [`parse_locus`] rejects.
    pub fn from_reader<R: Read>(reader: R, feature: &str) -> Result<Self> {
        let mut loci = Vec::new();
        let mut skipped = 0usize;
        for line in BufReader::new(reader).lines() {
            let line = line?;
            match parse_locus(&line, feature) {
                Some(l) => loci.push(l),
                None => {
                    let t = line.trim();
                    if !t.is_empty() && !t.starts_with('#') {
                        skipped += 1;
                    }
                }
            }
        }
        if skipped > 0 {
            debug!(skipped, "coordinate rows skipped (other feature types or malformed)");
        }
        Ok(Self::from_loci(loci))
    }

    /// Load a coordinate table; `Ok(None)` when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P, feature: &str) -> Result<Option<Self>> {
        let p = path.as_ref();
        if !p.exists() {
            warn!(path = %p.display(), "coordinate table not found; genomic context will be skipped");
            return Ok(None);
        }
        Self::from_reader(std::fs::File::open(p)?, feature).map(Some)
    }

    pub fn n_contigs(&self) -> usize { self.contigs.len() }

    pub fn loci(&self, contig: &str) -> Option<&[GenomicLocus]> {
        self.index.get(contig).map(|&i| self.contigs[i].1.as_slice())
    }

    /// `max(end) − min(start)` over the loci of one contig.
    pub fn span(loci: &[GenomicLocus]) -> u64 {
        let lo = loci.iter().map(|l| l.start).min().unwrap_or(0);
        let hi = loci.iter().map(|l| l.end).max().unwrap_or(0);
        hi.saturating_sub(lo)
    }

    /// Label every candidate locus. Candidates absent from the table get no
    /// verdict; a candidate listed twice keeps its first locus.
    pub fn isolation(&self, candidates: &HashSet<String>, min_span: u64) -> Vec<IsolationVerdict> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for (_, loci) in &self.contigs {
            let span = Self::span(loci);
            for l in loci {
                if !candidates.contains(&l.id) || !seen.insert(l.id.as_str()) {
                    continue;
                }
                let basis = if loci.len() == 1 {
                    IsolationBasis::SoleOrf
                } else if span < min_span {
                    IsolationBasis::ShortContig
                } else {
                    IsolationBasis::Contextual
                };
                out.push(IsolationVerdict { id: l.id.clone(), isolated: basis != IsolationBasis::Contextual, basis });
            }
        }
        out
    }
}

pub fn verdict_for(isolated_percentage: f64) -> Verdict {
    if isolated_percentage < 30.0 {
        Verdict::Pass
    } else if isolated_percentage < 50.0 {
        Verdict::Review
    } else {
        Verdict::Fail
    }
}

/// Genomic-context test. Without a coordinate table the test is skipped and
/// the isolated set is empty.
pub fn analyze(groups: Option<&ContigGroups>, candidates: &HashSet<String>, min_span: u64) -> ContextResult {
    let Some(groups) = groups else {
        info!("genomic context skipped: no coordinate table");
        return ContextResult::skipped();
    };
    let verdicts = groups.isolation(candidates, min_span);
    let isolated_ids: Vec<String> = verdicts.iter().filter(|v| v.isolated).map(|v| v.id.clone()).collect();
    let isolated = isolated_ids.len();
    let contextual = verdicts.len() - isolated;
    let isolated_percentage = percentage(isolated, isolated + contextual);
    let verdict = verdict_for(isolated_percentage);
    info!(contigs = groups.n_contigs(), isolated, contextual, isolated_percentage, %verdict, "genomic context");
    ContextResult { isolated, contextual, isolated_percentage, isolated_ids, verdict }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locus(contig: &str, start: u64, end: u64, id: &str) -> GenomicLocus {
        GenomicLocus { contig: contig.into(), start, end, id: id.into() }
    }

    fn ids(v: &[&str]) -> HashSet<String> { v.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn parses_prodigal_rows() {
        let row = "k141_7\tProdigal_v2.6.3\tCDS\t10\t50\t3.1\t+\t0\tID=7_1;partial=00;start_type=ATG;";
        assert_eq!(parse_locus(row, "CDS"), Some(locus("k141_7", 10, 50, "7_1")));
        assert_eq!(parse_locus("##gff-version 3", "CDS"), None);
        assert_eq!(parse_locus(&row.replace("CDS", "tRNA"), "CDS"), None);
        assert_eq!(parse_locus("k\tx\tCDS\t10\t50", "CDS"), None, "fewer than 9 fields");
        assert_eq!(parse_locus("k\tx\tCDS\t10\t50\t.\t+\t0\tpartial=00", "CDS"), None, "no ID");
        assert_eq!(parse_locus("k\tx\tCDS\tten\t50\t.\t+\t0\tID=a", "CDS"), None);
        assert_eq!(parse_locus("k\tx\tCDS\t60\t50\t.\t+\t0\tID=a", "CDS"), None);
        assert_eq!(parse_locus("k\tx\tCDS\t1\t5\t.\t+\t0\tlocus_ID=z;ID=a", "CDS").map(|l| l.id), Some("a".into()));
    }

    #[test]
    fn sole_locus_is_isolated_regardless_of_span() {
        let g = ContigGroups::from_loci([locus("c1", 10, 50, "P1"), locus("c2", 1, 9000, "P2")]);
        let v = g.isolation(&ids(&["P1", "P2"]), 500);
        assert!(v.iter().all(|x| x.isolated && x.basis == IsolationBasis::SoleOrf));
    }

    #[test]
    fn span_decides_for_multi_locus_contigs() {
        let g = ContigGroups::from_loci([
            locus("short", 1, 200, "a"),
            locus("long", 1, 300, "c"),
            locus("short", 250, 400, "b"),
            locus("long", 400, 1200, "d"),
        ]);
        assert_eq!(g.n_contigs(), 2);
        assert_eq!(ContigGroups::span(g.loci("short").unwrap()), 399);
        let v = g.isolation(&ids(&["a", "c", "d"]), 500);
        assert_eq!(v.len(), 3);
        assert_eq!(v[0], IsolationVerdict { id: "a".into(), isolated: true, basis: IsolationBasis::ShortContig });
        assert!(v[1..].iter().all(|x| x.basis == IsolationBasis::Contextual && !x.isolated));
    }

    #[test]
    fn span_boundary_is_exclusive() {
        let g = ContigGroups::from_loci([
            locus("narrow", 1, 100, "a"),
            locus("narrow", 400, 500, "b"),
            locus("wide", 1, 100, "c"),
            locus("wide", 400, 501, "d"),
        ]);
        assert_eq!(ContigGroups::span(g.loci("narrow").unwrap()), 499);
        assert_eq!(ContigGroups::span(g.loci("wide").unwrap()), 500);
        let v = g.isolation(&ids(&["a", "c"]), 500);
        assert_eq!(v[0], IsolationVerdict { id: "a".into(), isolated: true, basis: IsolationBasis::ShortContig });
        assert_eq!(v[1], IsolationVerdict { id: "c".into(), isolated: false, basis: IsolationBasis::Contextual });
    }

    #[test]
    fn thresholds() {
        assert_eq!(verdict_for(0.0), Verdict::Pass);
        assert_eq!(verdict_for(29.99), Verdict::Pass);
        assert_eq!(verdict_for(30.0), Verdict::Review);
        assert_eq!(verdict_for(49.99), Verdict::Review);
        assert_eq!(verdict_for(50.0), Verdict::Fail);
        assert_eq!(verdict_for(100.0), Verdict::Fail);
    }

    #[test]
    fn non_candidates_still_count_towards_occupancy() {
        let g = ContigGroups::from_loci([locus("c", 1, 300, "cand"), locus("c", 400, 2000, "other")]);
        let v = g.isolation(&ids(&["cand"]), 500);
        assert_eq!(v, vec![IsolationVerdict { id: "cand".into(), isolated: false, basis: IsolationBasis::Contextual }]);
    }

    #[test]
    fn analyze_aggregates_and_skips() {
        let gff = "##gff-version 3\n\
                   c1\tP\tCDS\t10\t50\t.\t+\t0\tID=P1;\n\
                   c2\tP\tCDS\t1\t300\t.\t+\t0\tID=P2;\n\
                   c2\tP\tCDS\t400\t2000\t.\t-\t0\tID=P3;\n\
                   c2\tP\tCDS\tbad\n";
        let g = ContigGroups::from_reader(gff.as_bytes(), "CDS").unwrap();
        let r = analyze(Some(&g), &ids(&["P1", "P2", "P3"]), 500);
        assert_eq!((r.isolated, r.contextual), (1, 2));
        assert_eq!(r.isolated_ids, vec!["P1".to_string()]);
        assert_eq!(r.verdict, Verdict::Review);

        let skipped = analyze(None, &ids(&["P1"]), 500);
        assert_eq!(skipped.verdict, Verdict::Skipped);
        assert!(skipped.isolated_ids.is_empty());

        let none = analyze(Some(&g), &HashSet::new(), 500);
        assert_eq!(none.isolated_percentage, 0.0);
        assert_eq!(none.verdict, Verdict::Pass);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContigGroups::load(dir.path().join("x.gff"), "CDS").unwrap().is_none());
    }
}
