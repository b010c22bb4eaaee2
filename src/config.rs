//! Run configuration.
//!
//! Thresholds default to the values the pipeline has always used; the CLI
//! overrides them field by field.
//!
//! ```rust
//! use novatriage::config::TriageConfig;
//!
//! let cfg = TriageConfig { min_length: 80, ..Default::default() };
//! assert!(cfg.validate().is_ok());
//! ```
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// Default minimum protein length (residues) for the quality filter.
pub const DEFAULT_MIN_LENGTH: usize = 100;
/// Coding span below which a multi-ORF contig is still considered isolated.
pub const DEFAULT_MIN_CONTEXT_SPAN: u64 = 500;
/// Feature type (GFF column 3) that counts as a coding locus.
pub const CODING_FEATURE: &str = "CDS";
pub const DEFAULT_REMOTE_HOMOLOGY_SAMPLES: usize = 20;
pub const DEFAULT_STRUCTURE_SAMPLES: usize = 10;
pub const DEFAULT_SEED: u64 = 42;

/// Settings for one triage run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Sequences shorter than this are rejected as `short`.
    pub min_length: usize,
    /// See [`DEFAULT_MIN_CONTEXT_SPAN`].
    pub min_context_span: u64,
    /// Feature type accepted from coordinate tables.
    pub coding_feature: String,
    /// Manual remote-homology samples to draw.
    pub remote_homology_samples: usize,
    /// Manual structure-search samples to draw.
    pub structure_samples: usize,
    /// Seed for the manual sample generator.
    pub seed: u64,
    /// Worker threads; `None` uses all logical cores.
    pub threads: Option<usize>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            min_context_span: DEFAULT_MIN_CONTEXT_SPAN,
            coding_feature: CODING_FEATURE.to_string(),
            remote_homology_samples: DEFAULT_REMOTE_HOMOLOGY_SAMPLES,
            structure_samples: DEFAULT_STRUCTURE_SAMPLES,
            seed: DEFAULT_SEED,
            threads: None,
        }
    }
}

impl TriageConfig {
    /// Reject settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.coding_feature.trim().is_empty() {
            return Err(TriageError::InvalidConfig("coding feature type must not be empty".into()));
        }
        if self.threads == Some(0) {
            return Err(TriageError::InvalidConfig("threads must be at least 1 (omit for all cores)".into()));
        }
        Ok(())
    }

    /// Effective worker count.
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Build the local rayon pool used for per-sequence work.
    pub fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_threads())
            .build()
            .map_err(|e| TriageError::InvalidConfig(e.to_string()))
    }
}
