//! Per-language task counts: cumulative, all project types, and periodic.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{Grouped, LanguageKey, Tally};
use crate::capability::{ProjectFamily, DEFAULT_CUMULATIVE_PROJECT_TYPES};
use crate::compose::{language_rows, number_value, PeriodBlock, ReportRow, RowBuilder};
use crate::error::CoreError;
use crate::metrics::{format_hms, transcription_duration, word_count, MetricKind};
use crate::period::{partition, Granularity, Period};
use crate::records::{Dataset, TaskRecord};
use crate::stage::{final_annotation, Stage, StageScope};
use crate::types::{Date, DbId};

/// What a per-language row measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageMetric {
    TaskCount,
    WordCount,
    AudioDuration,
}

impl LanguageMetric {
    /// Plain counts unless `metainfo` asks for the family's size metric.
    /// `None` when the family has no size metric.
    pub fn select(family: ProjectFamily, metainfo: bool) -> Option<Self> {
        if !metainfo {
            return Some(Self::TaskCount);
        }
        let caps = family.capabilities();
        if caps.supports(MetricKind::WordCount) {
            Some(Self::WordCount)
        } else if caps.supports(MetricKind::AudioDuration) {
            Some(Self::AudioDuration)
        } else {
            None
        }
    }

    pub fn column_suffix(&self) -> &'static str {
        match self {
            Self::TaskCount => "tasks_count",
            Self::WordCount => "word_count",
            Self::AudioDuration => "aud_duration",
        }
    }

    fn extract(&self, dataset: &Dataset, task: &TaskRecord) -> Option<f64> {
        match self {
            Self::TaskCount => Some(1.0),
            Self::WordCount => word_count(task),
            Self::AudioDuration => {
                final_annotation(dataset, task).and_then(|a| transcription_duration(&a.result))
            }
        }
    }

    fn render(&self, tally: &Tally) -> Value {
        match self {
            Self::TaskCount => Value::from(tally.records()),
            Self::WordCount => number_value(tally.sum()),
            Self::AudioDuration => Value::String(format_hms(tally.sum())),
        }
    }
}

/// Tallies one stage's completed work per target language.
///
/// Every language used by a project of this type gets a group, even when no
/// project is far enough along to contribute. With a `window`, tasks count
/// only when the stage's annotation falls inside it.
fn language_tallies(
    dataset: &Dataset,
    workspace_id: DbId,
    project_type: &str,
    stage: Stage,
    metric: LanguageMetric,
    window: Option<&Period>,
) -> IndexMap<LanguageKey, Tally> {
    let scope = StageScope::for_stage(stage);
    let mut groups: Grouped<LanguageKey> = Grouped::new();
    let mut eligible: BTreeMap<DbId, LanguageKey> = BTreeMap::new();

    for project in dataset
        .projects()
        .filter(|p| p.workspace_id == workspace_id && p.project_type == project_type)
    {
        let key = LanguageKey::of(project.tgt_language.as_deref());
        groups.touch(key.clone());
        if scope.admits(project.project_stage) {
            eligible.insert(project.id, key);
        }
    }

    for task in dataset.tasks() {
        let Some(key) = eligible.get(&task.project_id) else {
            continue;
        };
        if !stage.is_completed(task) {
            continue;
        }
        let Some(period) = window else {
            groups.record(key.clone(), metric.extract(dataset, task));
            continue;
        };
        let mut in_window = stage
            .annotations(dataset, task)
            .filter(|a| stage.counts_as_completed(a) && period.contains(a.updated_at));
        match metric {
            LanguageMetric::TaskCount => {
                for _ in in_window {
                    groups.record(key.clone(), Some(1.0));
                }
            }
            LanguageMetric::WordCount | LanguageMetric::AudioDuration => {
                if in_window.next().is_some() {
                    groups.record(key.clone(), metric.extract(dataset, task));
                }
            }
        }
    }

    groups.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Cumulative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LanguageQuery {
    pub workspace_id: DbId,
    pub project_type: String,
    pub stage: Stage,
    pub metainfo: bool,
}

/// Cumulative per-language totals for one project type and stage.
pub fn cumulative_by_language(dataset: &Dataset, q: &LanguageQuery) -> Result<Vec<ReportRow>, CoreError> {
    dataset.workspace(q.workspace_id)?;
    let Some(metric) = LanguageMetric::select(ProjectFamily::of(&q.project_type), q.metainfo) else {
        return Ok(Vec::new());
    };
    let column = format!("cumulative_{}", metric.column_suffix());
    let groups = language_tallies(dataset, q.workspace_id, &q.project_type, q.stage, metric, None);
    Ok(language_rows(groups, |lang, tally| {
        RowBuilder::new()
            .text("language", lang)
            .value(&column, metric.render(tally))
            .build()
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct AllTypesQuery {
    pub workspace_id: DbId,
    /// Empty means the default project type list.
    pub project_types: Vec<String>,
    pub metainfo: bool,
}

/// `{project_type: rows}` with paired annotation (`ann_`) and review (`rew_`)
/// columns. Types without an applicable metric are left out.
pub fn cumulative_all_types(
    dataset: &Dataset,
    q: &AllTypesQuery,
) -> Result<IndexMap<String, Vec<ReportRow>>, CoreError> {
    dataset.workspace(q.workspace_id)?;

    let project_types: Vec<String> = if q.project_types.is_empty() {
        DEFAULT_CUMULATIVE_PROJECT_TYPES
            .iter()
            .map(|t| (*t).to_owned())
            .collect()
    } else {
        q.project_types.clone()
    };

    let mut out = IndexMap::new();
    for project_type in project_types {
        let Some(metric) = LanguageMetric::select(ProjectFamily::of(&project_type), q.metainfo) else {
            continue;
        };
        let suffix = metric.column_suffix();
        let ann = language_tallies(dataset, q.workspace_id, &project_type, Stage::Annotation, metric, None);
        let rew = language_tallies(dataset, q.workspace_id, &project_type, Stage::Review, metric, None);

        let paired: IndexMap<LanguageKey, (Tally, Tally)> = ann
            .into_iter()
            .map(|(key, tally)| {
                let review = rew.get(&key).copied().unwrap_or_default();
                (key, (tally, review))
            })
            .collect();

        let rows = language_rows(paired, |lang, (ann, rew)| {
            RowBuilder::new()
                .text("language", lang)
                .value(&format!("ann_cumulative_{suffix}"), metric.render(ann))
                .value(&format!("rew_cumulative_{suffix}"), metric.render(rew))
                .build()
        });
        out.insert(project_type, rows);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Periodic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PeriodicQuery {
    pub workspace_id: DbId,
    pub project_type: String,
    pub stage: Stage,
    pub granularity: Granularity,
    /// Defaults to the workspace creation date.
    pub start: Option<Date>,
    /// Defaults to `today`.
    pub end: Option<Date>,
    pub metainfo: bool,
    /// Supplied by the caller so the computation never reads the clock.
    pub today: Date,
}

/// Per-language rows repeated for each period between start and end.
pub fn periodical_by_language(dataset: &Dataset, q: &PeriodicQuery) -> Result<Vec<PeriodBlock>, CoreError> {
    let workspace = dataset.workspace(q.workspace_id)?;
    let anchor = q.start.unwrap_or_else(|| workspace.created_at.date_naive());
    let end = q.end.unwrap_or(q.today);
    let periods = partition(anchor, end, q.granularity)?;

    let Some(metric) = LanguageMetric::select(ProjectFamily::of(&q.project_type), q.metainfo) else {
        return Ok(Vec::new());
    };
    let column = format!("periodical_{}", metric.column_suffix());

    Ok(periods
        .into_iter()
        .map(|period| {
            let groups = language_tallies(
                dataset,
                q.workspace_id,
                &q.project_type,
                q.stage,
                metric,
                Some(&period),
            );
            let rows = language_rows(groups, |lang, tally| {
                RowBuilder::new()
                    .text("language", lang)
                    .value(&column, metric.render(tally))
                    .build()
            });
            PeriodBlock {
                granularity: q.granularity,
                period,
                rows,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
