//! Protein **FASTA / FASTA.GZ** input and output.
//!
//! ### Design
//! - Parsing is done with `needletail` (gzip is detected transparently).
//! - Output is plain FASTA, or gzip-compressed via `flate2` when the output
//!   path ends in `.gz`.
//!
//! ### Errors
//! Parse errors are reported as [`TriageError::Fasta`] with the offending path.
//!
//! ### Example
//! ```no_run
//! use novatriage::seqio;
//! let proteins = seqio::read_proteins("proteins.faa").unwrap();
//! println!("loaded {} proteins", proteins.len());
//! ```
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use needletail::errors::ParseErrorKind;
use needletail::{parse_fastx_file, parse_fastx_reader, FastxReader};
use tracing::{debug, warn};

use crate::error::{Result, TriageError};
use crate::record::ProteinRecord;

/// Residues per line when writing FASTA.
pub const FASTA_LINE_WIDTH: usize = 60;

/// Read every record of a protein FASTA file, in file order.
///
/// Duplicate identifiers keep their first occurrence. An empty file yields an
/// empty collection.
pub fn read_proteins<P: AsRef<Path>>(path: P) -> Result<Vec<ProteinRecord>> {
    let p = path.as_ref();
    match parse_fastx_file(p) {
        Ok(reader) => drain(reader, p),
        Err(e) if matches!(e.kind, ParseErrorKind::EmptyFile) => Ok(Vec::new()),
        Err(e) => Err(TriageError::Fasta { path: p.to_path_buf(), message: e.to_string() }),
    }
}

/// Like [`read_proteins`], over any reader (used for stdin and tests).
pub fn read_proteins_from<R: Read + Send + 'static>(reader: R) -> Result<Vec<ProteinRecord>> {
    let label = Path::new("<reader>");
    match parse_fastx_reader(reader) {
        Ok(r) => drain(r, label),
        Err(e) if matches!(e.kind, ParseErrorKind::EmptyFile) => Ok(Vec::new()),
        Err(e) => Err(TriageError::Fasta { path: label.to_path_buf(), message: e.to_string() }),
    }
}

fn drain(mut reader: Box<dyn FastxReader>, path: &Path) -> Result<Vec<ProteinRecord>> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    while let Some(record) = reader.next() {
        let rec = record.map_err(|e| TriageError::Fasta { path: path.to_path_buf(), message: e.to_string() })?;
        let header = String::from_utf8_lossy(rec.id()).to_string();
        let residues = String::from_utf8_lossy(&rec.seq()).to_string();
        let protein = ProteinRecord::from_header(&header, &residues);
        if protein.id.is_empty() {
            debug!(path = %path.display(), "skipping record with empty header");
            continue;
        }
        if !seen.insert(protein.id.clone()) {
            warn!(id = %protein.id, "duplicate protein identifier; keeping first occurrence");
            continue;
        }
        out.push(protein);
    }
    Ok(out)
}

/// Write one FASTA record, wrapping residues at [`FASTA_LINE_WIDTH`].
pub fn write_fasta_record<W: Write>(w: &mut W, header: &str, residues: &str) -> std::io::Result<()> {
    w.write_all(b">")?;
    w.write_all(header.as_bytes())?;
    w.write_all(b"\n")?;
    for chunk in residues.as_bytes().chunks(FASTA_LINE_WIDTH) {
        w.write_all(chunk)?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// Write `records` to `path`; gzip when the path ends in `.gz`.
pub fn write_proteins<'a, P, I>(path: P, records: I) -> Result<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a ProteinRecord>,
{
    let p = path.as_ref();
    let writer = BufWriter::new(File::create(p)?);
    let gz = p.to_string_lossy().to_ascii_lowercase().ends_with(".gz");
    let mut n = 0usize;
    if gz {
        let mut enc = flate2::write::GzEncoder::new(writer, flate2::Compression::default());
        for r in records {
            write_fasta_record(&mut enc, &r.header, &r.residues)?;
            n += 1;
        }
        enc.finish()?.flush()?;
    } else {
        let mut w = writer;
        for r in records {
            write_fasta_record(&mut w, &r.header, &r.residues)?;
            n += 1;
        }
        w.flush()?;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FAA: &str = ">p1 # 1 # 300 # 1 # ID=1_1;partial=00\nMKV\nLLA*\n>p2 desc\nMAAA\n>p1 again\nMQQ\n";

    #[test]
    fn reads_headers_and_joins_lines() {
        let v = read_proteins_from(Cursor::new(FAA.as_bytes().to_vec())).unwrap();
        assert_eq!(v.len(), 2, "duplicate p1 is dropped");
        assert_eq!(v[0].id, "p1");
        assert_eq!(v[0].residues, "MKVLLA*");
        assert!(v[0].header.contains("partial=00"));
        assert_eq!(v[1].header, "p2 desc");
    }

    #[test]
    fn round_trips_through_plain_and_gzip_files() {
        let dir = tempfile::tempdir().unwrap();
        let recs = vec![ProteinRecord::from_header("a x=1", &"M".repeat(130)), ProteinRecord::from_header("b", "MK")];
        for name in ["out.faa", "out.faa.gz"] {
            let path = dir.path().join(name);
            assert_eq!(write_proteins(&path, &recs).unwrap(), 2);
            let back = read_proteins(&path).unwrap();
            assert_eq!(back, recs);
        }
    }

    #[test]
    fn wraps_long_sequences() {
        let mut buf = Vec::new();
        write_fasta_record(&mut buf, "x", &"A".repeat(61)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn empty_input_is_empty_collection() {
        let v = read_proteins_from(Cursor::new(Vec::new())).unwrap();
        assert!(v.is_empty());
    }
}
