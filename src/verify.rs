//! Verification suite over the filtered candidates.
//!
//! Runs the four verification tests, classifies every candidate and
//! optionally draws manual-check samples. The resulting
//! [`VerificationReport`] is what the JSON dump and the Markdown report are
//! rendered from.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact::artifact_test;
use crate::classify::{MatchSets, Partition};
use crate::composition::{composition_test, EXPECTED_AA_FREQ};
use crate::config::TriageConfig;
use crate::context::{analyze, ContigGroups};
use crate::hits::contamination_check;
use crate::record::{ArtifactResult, CompositionResult, ContaminationResult, ContextResult, ProteinRecord, Verdict};
use crate::sample::{self, ManualSamples};

/// External match sets, owned. Borrowed into [`MatchSets`] once the isolated
/// set is known.
#[derive(Clone, Debug, Default)]
pub struct ExternalMatches {
    pub domain: Option<HashSet<String>>,
    pub remote_homolog: Option<HashSet<String>>,
    pub structure: Option<HashSet<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub candidates: usize,
    pub human_contamination: ContaminationResult,
    pub aa_composition: CompositionResult,
    pub protein_classification: ArtifactResult,
    pub genomic_context: ContextResult,
    pub classifications: Partition,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub manual_samples: Option<ManualSamples>,
    /// Rendered sample instructions; not part of the JSON dump.
    #[serde(skip)]
    pub manual_instructions: Option<String>,
}

impl VerificationReport {
    /// `(test name, verdict)` for the four automated tests, in report order.
    pub fn verdicts(&self) -> [(&'static str, Verdict); 4] {
        [
            ("Human contamination", self.human_contamination.verdict),
            ("AA composition", self.aa_composition.verdict),
            ("Protein classification", self.protein_classification.verdict),
            ("Genomic context", self.genomic_context.verdict),
        ]
    }

    /// Worst verdict among the tests that ran; `Skipped` only if none ran.
    pub fn overall(&self) -> Verdict {
        let ran: Vec<Verdict> = self.verdicts().iter().map(|(_, v)| *v).filter(|v| *v != Verdict::Skipped).collect();
        if ran.is_empty() {
            Verdict::Skipped
        } else if ran.contains(&Verdict::Fail) {
            Verdict::Fail
        } else if ran.contains(&Verdict::Review) {
            Verdict::Review
        } else {
            Verdict::Pass
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run every test. Call inside the configured thread pool to bound the
/// parallel stages.
pub fn run_verification(
    candidates: &[ProteinRecord],
    human_hits: Option<&HashSet<String>>,
    groups: Option<&ContigGroups>,
    external: &ExternalMatches,
    cfg: &TriageConfig,
    generate_samples: bool,
) -> VerificationReport {
    info!(candidates = candidates.len(), "verification started");
    let human_contamination = contamination_check(human_hits);

    let seqs: Vec<&str> = candidates.iter().map(|r| r.residues.as_str()).collect();
    let aa_composition = composition_test(seqs.iter().copied(), &EXPECTED_AA_FREQ);
    let protein_classification = artifact_test(&seqs);

    let ids: HashSet<String> = candidates.iter().map(|r| r.id.clone()).collect();
    let genomic_context = analyze(groups, &ids, cfg.min_context_span);

    let isolated: HashSet<String> = genomic_context.isolated_ids.iter().cloned().collect();
    let sets = MatchSets {
        isolated: groups.map(|_| &isolated),
        domain: external.domain.as_ref(),
        remote_homolog: external.remote_homolog.as_ref(),
        structure: external.structure.as_ref(),
    };
    let classifications = Partition::classify(candidates.iter().map(|r| r.id.as_str()), &sets);

    let (manual_samples, manual_instructions) = if generate_samples {
        let (s, text) = sample::generate(candidates, cfg.remote_homology_samples, cfg.structure_samples, cfg.seed);
        (Some(s), Some(text))
    } else {
        (None, None)
    };

    let report = VerificationReport {
        candidates: candidates.len(),
        human_contamination,
        aa_composition,
        protein_classification,
        genomic_context,
        classifications,
        manual_samples,
        manual_instructions,
    };
    info!(overall = %report.overall(), "verification complete");
    report
}
