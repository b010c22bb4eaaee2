use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use novatriage::config::{self, TriageConfig};
use novatriage::context::ContigGroups;
use novatriage::filter::{triage_novel, QualityFilter};
use novatriage::verify::{run_verification, ExternalMatches};
use novatriage::{hits, report, seqio, table, Partition};

/// novatriage CLI
#[derive(Parser)]
#[command(name = "novatriage")]
#[command(version)]
#[command(about = "Quality filtering, verification and Type A-E classification of novel proteins", long_about = None)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Log debug detail (skipped records, per-stage counts)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Threads {
    /// Worker threads (default: all logical cores)
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Separate novel proteins from database hits and apply the quality filter
    Filter {
        /// Predicted proteins (FASTA, optionally gzipped)
        #[arg(long)]
        proteins: PathBuf,
        /// Hit table as LABEL=PATH (m8; first column is the query id). Repeatable.
        #[arg(long = "hits", value_name = "LABEL=PATH")]
        hits: Vec<String>,
        /// Filtered FASTA output (gzip when ending in .gz)
        #[arg(long)]
        output: PathBuf,
        /// Filter statistics (Markdown)
        #[arg(long)]
        stats: Option<PathBuf>,
        /// Minimum protein length in residues
        #[arg(long, default_value_t = config::DEFAULT_MIN_LENGTH)]
        min_length: usize,
        #[command(flatten)]
        threads: Threads,
    },

    /// Run verification tests and classify the filtered candidates
    Verify {
        /// Filtered candidates (FASTA)
        #[arg(long)]
        proteins: PathBuf,
        /// Human-proteome hit table (m8); contamination test is skipped without it
        #[arg(long)]
        human_hits: Option<PathBuf>,
        /// Gene-caller coordinates (GFF3); genomic context is skipped without it
        #[arg(long)]
        gff: Option<PathBuf>,
        /// Ids with conserved-domain matches (one per line or m8)
        #[arg(long)]
        domain_hits: Option<PathBuf>,
        /// Ids with remote-homology matches
        #[arg(long)]
        homolog_hits: Option<PathBuf>,
        /// Ids with structure-search matches
        #[arg(long)]
        structure_hits: Option<PathBuf>,
        /// Verification report (Markdown)
        #[arg(long)]
        output_report: PathBuf,
        /// Full results dump (JSON)
        #[arg(long)]
        output_json: Option<PathBuf>,
        /// Draw manual-verification samples
        #[arg(long)]
        generate_samples: bool,
        /// Sample instructions output (default: next to the report)
        #[arg(long)]
        samples_output: Option<PathBuf>,
        /// Seed for sample selection
        #[arg(long, default_value_t = config::DEFAULT_SEED)]
        seed: u64,
        /// Contig span (bp) below which all ORFs on the contig count as isolated
        #[arg(long, default_value_t = config::DEFAULT_MIN_CONTEXT_SPAN)]
        min_context_span: u64,
        #[command(flatten)]
        threads: Threads,
    },

    /// Build the final per-protein table and its summary
    Table {
        /// Filtered candidates (FASTA)
        #[arg(long)]
        proteins: PathBuf,
        /// Taxonomy TSV (protein_id, contig_id, taxonomy)
        #[arg(long)]
        taxonomy: PathBuf,
        /// Verification JSON carrying the classifications
        #[arg(long)]
        classifications: Option<PathBuf>,
        /// Final table (TSV)
        #[arg(long)]
        output_tsv: PathBuf,
        /// Summary (Markdown)
        #[arg(long)]
        output_summary: PathBuf,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default = if quiet { "warn" } else if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Filter { proteins, hits, output, stats, min_length, threads } => {
            let cfg = TriageConfig { min_length, threads: threads.threads, ..Default::default() };
            cmd_filter(&cfg, &proteins, &hits, &output, stats.as_deref())
        }
        Commands::Verify {
            proteins,
            human_hits,
            gff,
            domain_hits,
            homolog_hits,
            structure_hits,
            output_report,
            output_json,
            generate_samples,
            samples_output,
            seed,
            min_context_span,
            threads,
        } => {
            let cfg = TriageConfig { seed, min_context_span, threads: threads.threads, ..Default::default() };
            let external = ExternalMatches {
                domain: hits::load_optional_hit_ids(domain_hits.as_ref())?,
                remote_homolog: hits::load_optional_hit_ids(homolog_hits.as_ref())?,
                structure: hits::load_optional_hit_ids(structure_hits.as_ref())?,
            };
            let human = hits::load_optional_hit_ids(human_hits.as_ref())?;
            let samples_path = generate_samples
                .then(|| samples_output.unwrap_or_else(|| output_report.with_file_name("manual_verification_samples.txt")));
            cmd_verify(&cfg, &proteins, human.as_ref(), gff.as_deref(), &external, &output_report, output_json.as_deref(), samples_path.as_deref())
        }
        Commands::Table { proteins, taxonomy, classifications, output_tsv, output_summary } => {
            cmd_table(&proteins, &taxonomy, classifications.as_deref(), &output_tsv, &output_summary)
        }
    }
}

/// `LABEL=PATH`, or a bare path labelled by its file stem.
fn parse_hit_arg(arg: &str) -> (String, PathBuf) {
    match arg.split_once('=') {
        Some((label, path)) => (label.to_string(), PathBuf::from(path)),
        None => {
            let p = PathBuf::from(arg);
            let label = p.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| arg.to_string());
            (label, p)
        }
    }
}

fn cmd_filter(cfg: &TriageConfig, proteins: &Path, hit_args: &[String], output: &Path, stats: Option<&Path>) -> Result<()> {
    cfg.validate()?;
    let records = seqio::read_proteins(proteins).with_context(|| format!("reading {}", proteins.display()))?;
    let mut databases: Vec<(String, HashSet<String>)> = Vec::new();
    for arg in hit_args {
        let (label, path) = parse_hit_arg(arg);
        let ids = hits::load_hit_ids(&path).with_context(|| format!("reading hit table {}", path.display()))?;
        databases.push((label, ids));
    }

    let qf = QualityFilter::new(cfg.min_length);
    let pool = cfg.thread_pool()?;
    let (filter_stats, kept) = pool.install(|| triage_novel(&records, &databases, &qf));

    let n = seqio::write_proteins(output, &kept).with_context(|| format!("writing {}", output.display()))?;
    info!(written = n, path = %output.display(), "filtered proteins written");
    if let Some(p) = stats {
        std::fs::write(p, report::filter_stats_markdown(&filter_stats)).with_context(|| format!("writing {}", p.display()))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_verify(
    cfg: &TriageConfig,
    proteins: &Path,
    human: Option<&HashSet<String>>,
    gff: Option<&Path>,
    external: &ExternalMatches,
    output_report: &Path,
    output_json: Option<&Path>,
    samples_path: Option<&Path>,
) -> Result<()> {
    cfg.validate()?;
    let candidates = seqio::read_proteins(proteins).with_context(|| format!("reading {}", proteins.display()))?;
    let groups = match gff {
        Some(p) => ContigGroups::load(p, &cfg.coding_feature).with_context(|| format!("reading {}", p.display()))?,
        None => None,
    };

    let pool = cfg.thread_pool()?;
    let result = pool.install(|| run_verification(&candidates, human, groups.as_ref(), external, cfg, samples_path.is_some()));

    std::fs::write(output_report, report::verification_markdown(&result, &report::timestamp()))
        .with_context(|| format!("writing {}", output_report.display()))?;
    if let Some(p) = output_json {
        std::fs::write(p, result.to_json()?).with_context(|| format!("writing {}", p.display()))?;
    }
    if let (Some(p), Some(text)) = (samples_path, result.manual_instructions.as_ref()) {
        std::fs::write(p, text).with_context(|| format!("writing {}", p.display()))?;
        info!(path = %p.display(), "manual verification samples written");
    }
    println!("{}\t{}", result.overall(), output_report.display());
    Ok(())
}

fn cmd_table(proteins: &Path, taxonomy: &Path, classifications: Option<&Path>, output_tsv: &Path, output_summary: &Path) -> Result<()> {
    let records = seqio::read_proteins(proteins).with_context(|| format!("reading {}", proteins.display()))?;
    let tax = table::load_taxonomy(taxonomy).with_context(|| format!("reading {}", taxonomy.display()))?;
    let partition = match classifications {
        Some(p) if p.exists() => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            let v: serde_json::Value = serde_json::from_str(&text).with_context(|| format!("parsing {}", p.display()))?;
            Partition::from_json_value(&v)
        }
        Some(p) => {
            warn!(path = %p.display(), "classifications not found; every protein is reported as Type A");
            Partition::default()
        }
        None => Partition::default(),
    };

    let rows = table::build_rows(&records, &tax, &partition);
    table::write_tsv(output_tsv, &rows).with_context(|| format!("writing {}", output_tsv.display()))?;
    std::fs::write(output_summary, table::summary_markdown(&rows, &report::timestamp()))
        .with_context(|| format!("writing {}", output_summary.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_args_take_label_or_stem() {
        assert_eq!(parse_hit_arg("UniRef90=/x/u.m8"), ("UniRef90".to_string(), PathBuf::from("/x/u.m8")));
        assert_eq!(parse_hit_arg("/x/swissprot.m8"), ("swissprot".to_string(), PathBuf::from("/x/swissprot.m8")));
    }

    #[test]
    fn cli_parses_verify() {
        let cli = Cli::try_parse_from([
            "novatriage", "-q", "verify", "--proteins", "p.faa", "--output-report", "r.md", "--generate-samples",
        ])
        .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Verify { generate_samples, seed, .. } => {
                assert!(generate_samples);
                assert_eq!(seed, config::DEFAULT_SEED);
            }
            _ => panic!("expected verify"),
        }
    }
}
