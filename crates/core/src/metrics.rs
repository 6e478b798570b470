//! Per-record metric extraction.
//!
//! Every extractor returns `Option<f64>`: `None` means the payload field was
//! absent or malformed, and the record simply drops out of that metric's
//! sample. Nothing here can fail a report.

use serde::Serialize;
use serde_json::Value;

use crate::records::{AnnotationRecord, Dataset, TaskRecord};

/// Scalar a report can aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TaskCount,
    WordCount,
    /// Sum of transcribed segment lengths in an annotation result.
    AudioDuration,
    /// Length of the source audio recorded on the task.
    RawAudioDuration,
    LeadTime,
    WordErrorRate,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCount => "task_count",
            Self::WordCount => "word_count",
            Self::AudioDuration => "audio_duration",
            Self::RawAudioDuration => "raw_audio_duration",
            Self::LeadTime => "lead_time",
            Self::WordErrorRate => "word_error_rate",
        }
    }
}

/// Result item type holding segment boundaries.
const SEGMENT_ITEM: &str = "labels";
/// Result item type holding transcribed text.
const TEXT_ITEM: &str = "textarea";

// ---------------------------------------------------------------------------
// Task payload
// ---------------------------------------------------------------------------

fn non_negative(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite() && *v >= 0.0)
}

/// `data.word_count` of a task.
pub fn word_count(task: &TaskRecord) -> Option<f64> {
    task.data.get("word_count").and_then(non_negative)
}

/// `data.audio_duration` of a task, in seconds.
pub fn raw_audio_duration(task: &TaskRecord) -> Option<f64> {
    task.data.get("audio_duration").and_then(non_negative)
}

// ---------------------------------------------------------------------------
// Annotation payload
// ---------------------------------------------------------------------------

pub fn lead_time(annotation: &AnnotationRecord) -> Option<f64> {
    annotation.lead_time.filter(|v| v.is_finite() && *v >= 0.0)
}

fn items_of_type<'a>(result: &'a Value, kind: &'a str) -> Option<impl Iterator<Item = &'a Value>> {
    let items = result.as_array()?;
    Some(
        items
            .iter()
            .filter(move |item| item.get("type").and_then(Value::as_str) == Some(kind)),
    )
}

fn segment_length(item: &Value) -> Option<f64> {
    let value = item.get("value")?;
    let start = value.get("start")?.as_f64()?;
    let end = value.get("end")?.as_f64()?;
    (start.is_finite() && end.is_finite() && end >= start).then_some(end - start)
}

/// Total transcribed duration of a transcription result, in seconds.
///
/// Sums `end - start` over segment items. A result without segment items
/// falls back to its text items, which carry the same boundaries. A single
/// malformed segment makes the whole result unusable.
pub fn transcription_duration(result: &Value) -> Option<f64> {
    let mut segments = items_of_type(result, SEGMENT_ITEM)?.peekable();
    let lengths: Option<Vec<f64>> = if segments.peek().is_some() {
        segments.map(segment_length).collect()
    } else {
        items_of_type(result, TEXT_ITEM)?.map(segment_length).collect()
    };
    lengths.map(|l| l.iter().sum())
}

/// Words of a transcription result, in segment order.
pub fn transcript_words(result: &Value) -> Option<Vec<String>> {
    let mut words = Vec::new();
    for item in items_of_type(result, TEXT_ITEM)? {
        let texts = item.get("value")?.get("text")?.as_array()?;
        for text in texts {
            words.extend(text.as_str()?.split_whitespace().map(str::to_owned));
        }
    }
    Some(words)
}

/// Word error rate of `hypothesis` measured against `reference`.
///
/// Undefined (None) when the reference has no words.
pub fn word_error_rate(reference: &Value, hypothesis: &Value) -> Option<f64> {
    let reference = transcript_words(reference)?;
    let hypothesis = transcript_words(hypothesis)?;
    if reference.is_empty() {
        return None;
    }
    Some(strsim::generic_levenshtein(&reference, &hypothesis) as f64 / reference.len() as f64)
}

/// Word error rate of an annotation against the annotation it was derived
/// from. None when there is no parent to compare with.
pub fn annotation_word_error_rate(dataset: &Dataset, annotation: &AnnotationRecord) -> Option<f64> {
    let parent = dataset.parent_of(annotation)?;
    word_error_rate(&parent.result, &annotation.result)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Seconds as `H:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{transcription, DatasetBuilder};
    use crate::records::{AnnotationStatus, AnnotationType, ProjectStage, TaskStatus};
    use serde_json::json;

    fn task_with(data: Value) -> TaskRecord {
        let mut b = DatasetBuilder::new();
        let p = b.project(ProjectStage::Annotation, "ContextualTranslationEditing", None);
        let t = b.task(p, TaskStatus::Annotated);
        b.task_mut(t).data = data;
        b.build().task(t).unwrap().clone()
    }

    #[test]
    fn word_count_present() {
        assert_eq!(word_count(&task_with(json!({"word_count": 12}))), Some(12.0));
    }

    #[test]
    fn word_count_missing_or_malformed() {
        assert_eq!(word_count(&task_with(json!({}))), None);
        assert_eq!(word_count(&task_with(json!({"word_count": "twelve"}))), None);
        assert_eq!(word_count(&task_with(json!({"word_count": -3}))), None);
        assert_eq!(word_count(&task_with(json!(null))), None);
    }

    #[test]
    fn raw_audio_duration_reads_payload() {
        let t = task_with(json!({"audio_duration": 61.5}));
        assert_eq!(raw_audio_duration(&t), Some(61.5));
    }

    #[test]
    fn transcription_duration_sums_segments() {
        let result = transcription(&[(0.0, 2.5, "a"), (3.0, 4.0, "b")]);
        assert_eq!(transcription_duration(&result), Some(3.5));
    }

    #[test]
    fn transcription_duration_empty_result_is_zero() {
        assert_eq!(transcription_duration(&json!([])), Some(0.0));
    }

    #[test]
    fn transcription_duration_malformed() {
        assert_eq!(transcription_duration(&json!({"not": "a list"})), None);
        let backwards = json!([{"type": "labels", "value": {"start": 5.0, "end": 1.0}}]);
        assert_eq!(transcription_duration(&backwards), None);
        let missing_end = json!([{"type": "labels", "value": {"start": 5.0}}]);
        assert_eq!(transcription_duration(&missing_end), None);
    }

    #[test]
    fn transcription_duration_is_pure() {
        let result = transcription(&[(1.0, 2.0, "x")]);
        assert_eq!(transcription_duration(&result), transcription_duration(&result));
    }

    #[test]
    fn text_items_used_when_no_segments() {
        let result = json!([{"type": "textarea", "value": {"start": 1.0, "end": 4.0, "text": ["hi"]}}]);
        assert_eq!(transcription_duration(&result), Some(3.0));
    }

    #[test]
    fn word_error_rate_counts_edits() {
        let reference = transcription(&[(0.0, 1.0, "the cat sat down")]);
        let hypothesis = transcription(&[(0.0, 1.0, "the cat sit")]);
        // one substitution + one deletion over four reference words
        assert_eq!(word_error_rate(&reference, &hypothesis), Some(0.5));
        assert_eq!(word_error_rate(&reference, &reference), Some(0.0));
    }

    #[test]
    fn word_error_rate_needs_reference_words() {
        let empty = json!([]);
        let hypothesis = transcription(&[(0.0, 1.0, "hello")]);
        assert_eq!(word_error_rate(&empty, &hypothesis), None);
    }

    #[test]
    fn annotation_word_error_rate_requires_parent() {
        let mut b = DatasetBuilder::new();
        let p = b.project(ProjectStage::Review, "AudioTranscription", None);
        let t = b.task(p, TaskStatus::Reviewed);
        let a = b.annotation(t, AnnotationType::Annotator, AnnotationStatus::Labeled, 1);
        b.annotation_mut(a).result = transcription(&[(0.0, 1.0, "one two")]);
        let r = b.child(a, AnnotationType::Reviewer, AnnotationStatus::Accepted, 2);
        b.annotation_mut(r).result = transcription(&[(0.0, 1.0, "one three")]);
        let ds = b.build();

        assert_eq!(annotation_word_error_rate(&ds, ds.annotation(r).unwrap()), Some(0.5));
        assert_eq!(annotation_word_error_rate(&ds, ds.annotation(a).unwrap()), None);
    }

    #[test]
    fn format_hms_pads_and_does_not_wrap() {
        assert_eq!(format_hms(0.0), "0:00:00");
        assert_eq!(format_hms(3725.4), "1:02:05");
        assert_eq!(format_hms(90_000.0), "25:00:00");
        assert_eq!(format_hms(f64::NAN), "0:00:00");
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
