//! Project-type capability lookup.
//!
//! Resolves a project type to its family once per report. Report code asks
//! the resulting [`Capabilities`] which metric kinds apply instead of
//! matching on project-type names.

use serde::Serialize;

use crate::metrics::MetricKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectFamily {
    Translation,
    Audio,
    Other,
}

// ---------------------------------------------------------------------------
// Known project types
// ---------------------------------------------------------------------------

pub const TRANSLATION_PROJECT_TYPES: &[&str] = &[
    "ContextualTranslationEditing",
    "ContextualSentenceVerification",
    "ContextualSentenceVerificationAndDomainClassification",
    "SemanticTextualSimilarity_Scale5",
    "MonolingualTranslation",
    "TranslationEditing",
    "ConversationTranslation",
    "ConversationTranslationEditing",
];

pub const AUDIO_PROJECT_TYPES: &[&str] = &[
    "AudioTranscription",
    "AudioSegmentation",
    "AudioTranscriptionEditing",
    "AcousticNormalisedTranscriptionEditing",
    "SingleSpeakerAudioTranscriptionEditing",
];

/// Project types covered by the all-types cumulative report when the caller
/// does not name one.
pub const DEFAULT_CUMULATIVE_PROJECT_TYPES: &[&str] = &[
    "ContextualTranslationEditing",
    "ContextualSentenceVerification",
    "SemanticTextualSimilarity_Scale5",
    "AudioTranscriptionEditing",
    "AudioTranscription",
    "AudioSegmentation",
];

const COMMON_METRICS: &[MetricKind] = &[MetricKind::TaskCount, MetricKind::LeadTime];
const TRANSLATION_METRICS: &[MetricKind] = &[
    MetricKind::TaskCount,
    MetricKind::LeadTime,
    MetricKind::WordCount,
];
const AUDIO_METRICS: &[MetricKind] = &[
    MetricKind::TaskCount,
    MetricKind::LeadTime,
    MetricKind::AudioDuration,
    MetricKind::RawAudioDuration,
    MetricKind::WordErrorRate,
];

impl ProjectFamily {
    pub fn of(project_type: &str) -> Self {
        if TRANSLATION_PROJECT_TYPES.contains(&project_type)
            || project_type.to_lowercase().contains("translation")
        {
            Self::Translation
        } else if AUDIO_PROJECT_TYPES.contains(&project_type) {
            Self::Audio
        } else {
            Self::Other
        }
    }

    pub fn capabilities(self) -> Capabilities {
        let metrics = match self {
            Self::Translation => TRANSLATION_METRICS,
            Self::Audio => AUDIO_METRICS,
            Self::Other => COMMON_METRICS,
        };
        Capabilities {
            family: self,
            metrics,
        }
    }
}

/// Metric kinds applicable to one project family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub family: ProjectFamily,
    metrics: &'static [MetricKind],
}

impl Capabilities {
    pub fn for_project_type(project_type: &str) -> Self {
        ProjectFamily::of(project_type).capabilities()
    }

    pub fn supports(&self, kind: MetricKind) -> bool {
        self.metrics.contains(&kind)
    }

    pub fn metrics(&self) -> &'static [MetricKind] {
        self.metrics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
