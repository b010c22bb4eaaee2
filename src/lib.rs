#![forbid(unsafe_code)]
//! # novatriage
//!
//! Triage of **novel protein candidates** predicted from metagenomic assemblies:
//! separate proteins with no database homology, apply ordered **quality rules**,
//! run **verification tests** over the survivors and sort them into five
//! **novelty types** (A–E).
//!
//! ## Pipeline
//! 1. [`hits`] collects identifiers with database hits; the rest are *novel*.
//! 2. [`filter`] rejects short, start-less, internally stopped and partial ORFs.
//! 3. [`composition`], [`artifact`] and [`context`] score the survivors.
//! 4. [`classify`] partitions them into Types A–E using the isolated set and
//!    external match sets.
//! 5. [`report`] and [`table`] render Markdown, JSON and TSV outputs.
//!
//! Alignment, structure prediction and web-service calls are out of scope;
//! their results enter only as identifier sets.
//!
//! ## Examples
//! ```rust
//! use std::collections::HashSet;
//! use novatriage::classify::{MatchSets, NovelType, Partition};
//!
//! let structure: HashSet<String> = ["X".to_string()].into();
//! let domain: HashSet<String> = ["X".to_string(), "Y".to_string()].into();
//! let sets = MatchSets { structure: Some(&structure), domain: Some(&domain), ..Default::default() };
//! let p = Partition::classify(["X", "Y", "Z"], &sets);
//! assert_eq!(p.type_of("X"), Some(NovelType::B));
//! assert_eq!(p.type_of("Y"), Some(NovelType::D));
//! assert_eq!(p.type_of("Z"), Some(NovelType::A));
//! ```

pub mod artifact;
pub mod classify;
pub mod composition;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod hits;
pub mod properties;
pub mod record;
pub mod report;
pub mod sample;
pub mod seqio;
pub mod table;
pub mod verify;

pub use classify::{MatchSets, NovelType, Partition};
pub use config::TriageConfig;
pub use error::{Result, TriageError};
pub use filter::{FilterReason, FilterStats, QualityFilter};
pub use record::{ProteinRecord, Verdict};
pub use verify::{run_verification, ExternalMatches, VerificationReport};

/// Crate version string (from `CARGO_PKG_VERSION`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
