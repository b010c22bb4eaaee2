//! Final per-protein results table and its Markdown summary.
//!
//! Each surviving candidate is joined with its taxonomy (contig and organism,
//! from a `protein_id / contig_id / taxonomy` TSV), its Type A–E category and
//! its basic [`properties`](crate::properties). The table is built as a polars
//! `DataFrame` and written tab-separated.
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use polars::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::classify::{NovelType, Partition};
use crate::error::Result;
use crate::properties::properties;
use crate::record::{percentage, ProteinRecord};

pub const UNKNOWN_CONTIG: &str = "Unknown";
pub const UNCLASSIFIED_TAXON: &str = "Unclassified";
/// Organisms listed individually in the summary; the rest are pooled.
pub const TOP_ORGANISMS: usize = 20;
pub const TOP_BY_LENGTH: usize = 10;
/// `[low, high)` length bins in residues; `None` is open-ended.
pub const LENGTH_BINS: [(usize, Option<usize>); 5] =
    [(100, Some(200)), (200, Some(300)), (300, Some(500)), (500, Some(1000)), (1000, None)];

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TaxonomyEntry {
    #[serde(rename = "contig_id")]
    pub contig: String,
    pub taxonomy: String,
}

#[derive(Deserialize)]
struct TaxonomyRow {
    protein_id: String,
    contig_id: String,
    taxonomy: String,
}

/// Read a taxonomy TSV with a header row.
pub fn taxonomy_from_reader<R: Read>(reader: R) -> Result<HashMap<String, TaxonomyEntry>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).delimiter(b'\t').flexible(true).from_reader(reader);
    let mut map = HashMap::new();
    for row in rdr.deserialize() {
        let r: TaxonomyRow = row?;
        map.insert(r.protein_id, TaxonomyEntry { contig: r.contig_id, taxonomy: r.taxonomy });
    }
    Ok(map)
}

/// Load the taxonomy table; a missing file yields an empty map.
pub fn load_taxonomy<P: AsRef<Path>>(path: P) -> Result<HashMap<String, TaxonomyEntry>> {
    let p = path.as_ref();
    if !p.exists() {
        warn!(path = %p.display(), "taxonomy table not found; all proteins will be unclassified");
        return Ok(HashMap::new());
    }
    taxonomy_from_reader(std::fs::File::open(p)?)
}

/// One row of the final table.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalRow {
    pub protein_id: String,
    pub contig_id: String,
    pub organism: String,
    pub classification: NovelType,
    pub length_aa: usize,
    pub mw_kda: f64,
    pub gravy: f64,
    pub net_charge: f64,
    pub sequence: String,
}

/// Join proteins with taxonomy and classification. Proteins missing from the
/// partition are reported as Type A.
pub fn build_rows(
    proteins: &[ProteinRecord],
    taxonomy: &HashMap<String, TaxonomyEntry>,
    partition: &Partition,
) -> Vec<FinalRow> {
    let types = partition.lookup();
    proteins
        .iter()
        .map(|p| {
            let tax = taxonomy.get(&p.id);
            let props = properties(&p.residues);
            FinalRow {
                protein_id: p.id.clone(),
                contig_id: tax.map_or(UNKNOWN_CONTIG, |t| t.contig.as_str()).to_string(),
                organism: tax.map_or(UNCLASSIFIED_TAXON, |t| t.taxonomy.as_str()).to_string(),
                classification: types.get(p.id.as_str()).copied().unwrap_or(NovelType::A),
                length_aa: props.length,
                mw_kda: props.mw_kda,
                gravy: props.gravy,
                net_charge: props.net_charge,
                sequence: p.residues.clone(),
            }
        })
        .collect()
}

pub fn rows_to_dataframe(rows: &[FinalRow]) -> PolarsResult<DataFrame> {
    df!(
        "protein_id"     => rows.iter().map(|r| r.protein_id.clone()).collect::<Vec<_>>(),
        "contig_id"      => rows.iter().map(|r| r.contig_id.clone()).collect::<Vec<_>>(),
        "organism"       => rows.iter().map(|r| r.organism.clone()).collect::<Vec<_>>(),
        "classification" => rows.iter().map(|r| r.classification.label().to_string()).collect::<Vec<_>>(),
        "length_aa"      => rows.iter().map(|r| r.length_aa as u64).collect::<Vec<_>>(),
        "mw_kda"         => rows.iter().map(|r| r.mw_kda).collect::<Vec<_>>(),
        "gravy"          => rows.iter().map(|r| r.gravy).collect::<Vec<_>>(),
        "net_charge"     => rows.iter().map(|r| r.net_charge).collect::<Vec<_>>(),
        "sequence"       => rows.iter().map(|r| r.sequence.clone()).collect::<Vec<_>>(),
    )
}

/// Write the table as TSV with a header row.
pub fn write_tsv<P: AsRef<Path>>(path: P, rows: &[FinalRow]) -> Result<()> {
    let mut df = rows_to_dataframe(rows)?;
    let mut f = std::fs::File::create(path.as_ref())?;
    CsvWriter::new(&mut f).include_header(true).with_separator(b'\t').finish(&mut df)?;
    info!(rows = rows.len(), path = %path.as_ref().display(), "final table written");
    Ok(())
}

fn bin_label(low: usize, high: Option<usize>) -> String {
    match high {
        Some(h) => format!("{}-{} aa", low, h - 1),
        None => format!("≥{low} aa"),
    }
}

/// Markdown summary: sources, categories, length distribution, longest proteins.
pub fn summary_markdown(rows: &[FinalRow], generated: &str) -> String {
    let n = rows.len();
    let mut org: BTreeMap<&str, usize> = BTreeMap::new();
    let mut cls: BTreeMap<NovelType, usize> = BTreeMap::new();
    for r in rows {
        *org.entry(r.organism.as_str()).or_insert(0) += 1;
        *cls.entry(r.classification).or_insert(0) += 1;
    }
    let mut org_sorted: Vec<(&str, usize)> = org.into_iter().collect();
    org_sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let mut s = String::new();
    let _ = writeln!(s, "# Novel Protein Triage - Final Results Summary\n");
    let _ = writeln!(s, "Generated: {generated}\n");
    let _ = writeln!(s, "## Overview\n");
    let _ = writeln!(s, "| Metric | Value |\n|--------|-------|");
    let _ = writeln!(s, "| Total Novel Proteins | {n} |");
    let _ = writeln!(s, "| Unique Organisms | {} |\n", org_sorted.len());

    let _ = writeln!(s, "## Proteins by Microbial Source\n");
    let _ = writeln!(s, "| Organism | Novel Proteins | % of Total |\n|----------|---------------|------------|");
    for (o, c) in org_sorted.iter().take(TOP_ORGANISMS) {
        let _ = writeln!(s, "| {o} | {c} | {:.1}% |", percentage(*c, n));
    }
    if org_sorted.len() > TOP_ORGANISMS {
        let other: usize = org_sorted[TOP_ORGANISMS..].iter().map(|(_, c)| c).sum();
        let _ = writeln!(
            s,
            "| *Other ({} organisms)* | {other} | {:.1}% |",
            org_sorted.len() - TOP_ORGANISMS,
            percentage(other, n)
        );
    }

    let _ = writeln!(s, "\n## Proteins by Classification Type\n");
    let _ = writeln!(s, "| Type | Description | Count | % |\n|------|-------------|-------|---|");
    for (t, c) in &cls {
        let _ = writeln!(s, "| {} | {} | {c} | {:.1}% |", t.label(), t.description(), percentage(*c, n));
    }

    let _ = writeln!(s, "\n## Length Distribution\n");
    let _ = writeln!(s, "| Range | Count | % |\n|-------|-------|---|");
    for (low, high) in LENGTH_BINS {
        let c = rows.iter().filter(|r| r.length_aa >= low && high.map_or(true, |h| r.length_aa < h)).count();
        let _ = writeln!(s, "| {} | {c} | {:.1}% |", bin_label(low, high), percentage(c, n));
    }

    let _ = writeln!(s, "\n## Top {TOP_BY_LENGTH} Novel Proteins (by length)\n");
    let _ = writeln!(s, "| Protein ID | Organism | Length | Classification |\n|------------|----------|--------|----------------|");
    let mut by_len: Vec<&FinalRow> = rows.iter().collect();
    by_len.sort_by(|a, b| b.length_aa.cmp(&a.length_aa));
    for r in by_len.into_iter().take(TOP_BY_LENGTH) {
        let organism: String = r.organism.chars().take(30).collect();
        let _ = writeln!(s, "| {} | {organism} | {} aa | {} |", r.protein_id, r.length_aa, r.classification.label());
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MatchSets;
    use std::collections::HashSet;

    fn proteins() -> Vec<ProteinRecord> {
        vec![
            ProteinRecord::from_header("p1", &"M".repeat(150)),
            ProteinRecord::from_header("p2", &"MK".repeat(300)),
            ProteinRecord::from_header("p3", &"MA".repeat(60)),
        ]
    }

    #[test]
    fn taxonomy_reads_by_column_name() {
        let tsv = "contig_id\tprotein_id\ttaxonomy\nk1\tp1\tBacillus subtilis\n";
        let t = taxonomy_from_reader(tsv.as_bytes()).unwrap();
        assert_eq!(t["p1"], TaxonomyEntry { contig: "k1".into(), taxonomy: "Bacillus subtilis".into() });
    }

    #[test]
    fn rows_join_taxonomy_and_types() {
        let tax = taxonomy_from_reader("protein_id\tcontig_id\ttaxonomy\np1\tk1\tE. coli\n".as_bytes()).unwrap();
        let iso: HashSet<String> = ["p2".to_string()].into();
        let part = Partition::classify(["p1", "p2"], &MatchSets { isolated: Some(&iso), ..Default::default() });
        let rows = build_rows(&proteins(), &tax, &part);
        assert_eq!(rows[0].organism, "E. coli");
        assert_eq!(rows[1].contig_id, UNKNOWN_CONTIG);
        assert_eq!(rows[1].classification, NovelType::E);
        assert_eq!(rows[2].classification, NovelType::A, "unclassified defaults to Type A");
        assert_eq!(rows[1].length_aa, 600);
    }

    #[test]
    fn tsv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final.tsv");
        let rows = build_rows(&proteins(), &HashMap::new(), &Partition::default());
        write_tsv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("protein_id\tcontig_id\torganism\tclassification"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn summary_sections_and_bins() {
        let rows = build_rows(&proteins(), &HashMap::new(), &Partition::default());
        let md = summary_markdown(&rows, "2026-01-01T00:00:00Z");
        assert!(md.contains("| Total Novel Proteins | 3 |"));
        assert!(md.contains("| Unclassified | 3 | 100.0% |"));
        assert!(md.contains("| 100-199 aa | 2 | 66.7% |"));
        assert!(md.contains("| 500-999 aa | 1 | 33.3% |"));
        assert!(md.contains("| Type A Completely Novel |"));
        let top = md.split("by length)").nth(1).unwrap();
        assert!(top.find("p2").unwrap() < top.find("p1").unwrap());
    }

    #[test]
    fn summary_of_nothing_has_no_nan() {
        let md = summary_markdown(&[], "now");
        assert!(!md.contains("NaN"));
        assert!(md.contains("| 100-199 aa | 0 | 0.0% |"));
    }
}
