#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, fmt};

use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::info;

use super::{
    filter::{GradeFilter, parse_modified},
    store::{GradeKind, GradeStore},
};
use crate::keys::{CourseKey, InvalidKeyError};

/// An error in the command's flag combination, raised before any data
/// access.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Neither mode flag was given.
    #[error("Either --delete or --dry_run must be specified.")]
    MissingMode,
    /// Both mode flags were given.
    #[error("Only one of --delete and --dry_run may be specified.")]
    ModeConflict,
    /// Neither course selector was given.
    #[error("Either --courses or --all_courses must be specified.")]
    MissingCourseSelector,
    /// Both course selectors were given.
    #[error("Only one of --courses and --all_courses may be specified.")]
    CourseSelectorConflict,
    /// A course key failed to parse.
    #[error("Invalid key specified.")]
    InvalidKey(#[from] InvalidKeyError),
    /// `--modified_end` was given without `--modified_start`.
    #[error("Optional value for modified_end provided without a value for modified_start.")]
    EndWithoutStart,
    /// A modified-date bound did not parse.
    #[error("Could not parse `{value}` as a modified date; expected the format `%Y-%m-%d %H:%M`.")]
    InvalidDate {
        /// The rejected input.
        value:  String,
        /// The underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },
}

/// Which of the two run modes was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Report what would be deleted, touch nothing.
    DryRun,
    /// Actually delete the matching rows.
    Delete,
}

impl OperationMode {
    /// Name used in the start and finish banners.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DryRun => "dry_run",
            Self::Delete => "real",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw flag values as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// `--dry_run` was given.
    pub dry_run:        bool,
    /// `--delete` was given.
    pub delete:         bool,
    /// Values given to `--courses`, one key per occurrence.
    pub courses:        Vec<String>,
    /// `--all_courses` was given.
    pub all_courses:    bool,
    /// Value given to `--modified_start`.
    pub modified_start: Option<String>,
    /// Value given to `--modified_end`.
    pub modified_end:   Option<String>,
}

impl ResetOptions {
    /// Validates the flag combination and parses keys and dates, producing
    /// a runnable plan. Performs no data access.
    pub fn plan(&self) -> Result<ResetPlan, ConfigError> {
        let mode = match (self.dry_run, self.delete) {
            (false, false) => return Err(ConfigError::MissingMode),
            (true, true) => return Err(ConfigError::ModeConflict),
            (true, false) => OperationMode::DryRun,
            (false, true) => OperationMode::Delete,
        };

        let course_keys = match (self.all_courses, self.courses.as_slice()) {
            (false, []) => return Err(ConfigError::MissingCourseSelector),
            (true, [_, ..]) => return Err(ConfigError::CourseSelectorConflict),
            (true, []) => None,
            (false, raw_keys) => Some(
                raw_keys
                    .iter()
                    .map(|raw| raw.parse::<CourseKey>())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        let modified_start = self.modified_start.as_deref().map(parse_bound).transpose()?;
        let modified_end = match self.modified_end.as_deref() {
            Some(_) if modified_start.is_none() => return Err(ConfigError::EndWithoutStart),
            Some(value) => Some(parse_bound(value)?),
            None => None,
        };

        let mut filter = match course_keys {
            Some(keys) => GradeFilter::for_courses(keys),
            None => GradeFilter::all_courses(),
        };
        if let Some(start) = modified_start {
            filter = filter.with_modified_start(start);
        }
        if let Some(end) = modified_end {
            filter = filter.with_modified_end(end);
        }

        Ok(ResetPlan { mode, filter })
    }
}

/// Parses one modified-date bound, mapping the chrono failure into the
/// command's configuration error.
fn parse_bound(value: &str) -> Result<NaiveDateTime, ConfigError> {
    parse_modified(value).map_err(|source| ConfigError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// A validated invocation: the mode to run in and the filter to run with.
#[derive(Debug, Clone)]
pub struct ResetPlan {
    /// Mode to run in.
    pub mode:   OperationMode,
    /// Row selection shared by both grade kinds.
    pub filter: GradeFilter,
}

/// Per-course counts produced by a dry run over one grade kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    /// Grade kind the report covers.
    pub kind:       GradeKind,
    /// Matching row count per canonical course-key string, in key order.
    pub per_course: BTreeMap<String, u64>,
    /// Total matching rows across all courses.
    pub total:      u64,
}

/// Outcome of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Dry-run reports, one per grade kind.
    DryRun(Vec<GradeReport>),
    /// Deleted row counts, one per grade kind.
    Deleted(Vec<(GradeKind, u64)>),
}

/// Reports the rows `filter` selects in `store`, without touching them.
///
/// Logs one line per course plus a total, and returns the same counts.
pub async fn query_grades<S: GradeStore>(store: &S, filter: &GradeFilter) -> Result<GradeReport> {
    let kind = store.kind();
    let rows = store.query_grades(filter).await?;

    let mut per_course: BTreeMap<String, u64> = BTreeMap::new();
    for row in &rows {
        *per_course.entry(row.course_id.clone()).or_insert(0) += 1;
    }

    let mut total = 0;
    for (course_id, count) in &per_course {
        total += count;
        info!("reset_grades: Would delete {kind} for COURSE {course_id}: {count} row(s).");
    }
    info!("reset_grades: Would delete {kind} in TOTAL: {total} row(s).");

    Ok(GradeReport {
        kind,
        per_course,
        total,
    })
}

/// Deletes the rows `filter` selects in `store`, logging the count before
/// and after.
///
/// The count is computed once, up front; rows the grading pipeline writes
/// between the count and the delete are not reflected in the logged figure.
pub async fn delete_grades<S: GradeStore>(store: &S, filter: &GradeFilter) -> Result<u64> {
    let kind = store.kind();
    let count = store.query_grades(filter).await?.len() as u64;

    info!("reset_grades: Deleting {kind}: {count} row(s).");
    store.delete_grades(filter).await?;
    info!("reset_grades: Deleted {kind}: {count} row(s).");

    Ok(count)
}

/// Runs a validated plan against the two grade stores, subsection first.
///
/// The two kinds are processed independently with no overarching
/// transaction; a failure after the subsection pass leaves subsection rows
/// deleted and course rows intact.
pub async fn run<S, C>(plan: &ResetPlan, subsection: &S, course: &C) -> Result<ResetOutcome>
where
    S: GradeStore,
    C: GradeStore,
{
    info!("reset_grades: Started in {} mode!", plan.mode);

    let outcome = match plan.mode {
        OperationMode::DryRun => ResetOutcome::DryRun(vec![
            query_grades(subsection, &plan.filter).await?,
            query_grades(course, &plan.filter).await?,
        ]),
        OperationMode::Delete => ResetOutcome::Deleted(vec![
            (subsection.kind(), delete_grades(subsection, &plan.filter).await?),
            (course.kind(), delete_grades(course, &plan.filter).await?),
        ]),
    };

    info!("reset_grades: Finished in {} mode!", plan.mode);
    Ok(outcome)
}
