#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt, sync::Mutex};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use postgrest::{Builder, Postgrest};
use serde::Deserialize;

use super::filter::GradeFilter;
use crate::config;

/// Timestamp format sent in PostgREST filter parameters.
const PG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The two persisted grade granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradeKind {
    /// One row per learner per graded subsection.
    Subsection,
    /// One row per learner per course.
    Course,
}

impl GradeKind {
    /// Name used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subsection => "subsection grades",
            Self::Course => "course grades",
        }
    }
}

impl fmt::Display for GradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted grade row, reduced to the columns the reset tool reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GradeRow {
    /// Canonical course-key string the row belongs to.
    pub course_id: String,
    /// Timestamp of the row's last mutation.
    pub modified:  NaiveDateTime,
}

/// Storage port for one persisted-grade table.
///
/// Every implementation evaluates the same [`GradeFilter`], so the
/// population a report counts is the population a delete removes. Deletion
/// reports nothing back; callers wanting a figure count the selection first
/// and accept that the grading pipeline may write rows in between.
#[allow(async_fn_in_trait)]
pub trait GradeStore {
    /// The grade granularity this store holds.
    fn kind(&self) -> GradeKind;

    /// Returns the rows selected by `filter`.
    async fn query_grades(&self, filter: &GradeFilter) -> Result<Vec<GradeRow>>;

    /// Deletes the rows selected by `filter`.
    async fn delete_grades(&self, filter: &GradeFilter) -> Result<()>;
}

/// PostgREST-backed grade table.
///
/// Both kinds share this adapter; the table name and kind label are the
/// only per-kind state, so the filter translation below is the single place
/// where [`GradeFilter`] becomes a PostgREST query.
pub struct PostgrestGradeStore {
    /// Shared PostgREST client.
    client: Postgrest,
    /// Backing table name.
    table:  String,
    /// Granularity stored in `table`.
    kind:   GradeKind,
}

impl PostgrestGradeStore {
    /// Store over the subsection-grade table named in the configuration.
    pub fn subsection(client: Postgrest) -> Self {
        Self {
            client,
            table: config::subsection_table(),
            kind: GradeKind::Subsection,
        }
    }

    /// Store over the course-grade table named in the configuration.
    pub fn course(client: Postgrest) -> Self {
        Self {
            client,
            table: config::course_table(),
            kind: GradeKind::Course,
        }
    }

    /// Applies `filter` to a PostgREST request, mirroring
    /// [`GradeFilter::matches`] field for field.
    fn apply_filter(&self, mut request: Builder, filter: &GradeFilter) -> Builder {
        if let Some(keys) = filter.course_keys() {
            request = request.in_("course_id", keys.iter().map(ToString::to_string));
        }
        if let Some(start) = filter.modified_start() {
            request = request.gte("modified", start.format(PG_TIMESTAMP_FORMAT).to_string());
        }
        if let Some(end) = filter.modified_end() {
            request = request.lte("modified", end.format(PG_TIMESTAMP_FORMAT).to_string());
        }
        request
    }
}

impl GradeStore for PostgrestGradeStore {
    fn kind(&self) -> GradeKind {
        self.kind
    }

    async fn query_grades(&self, filter: &GradeFilter) -> Result<Vec<GradeRow>> {
        let request = self.apply_filter(
            self.client.from(&self.table).select("course_id,modified"),
            filter,
        );

        let response = request
            .execute()
            .await
            .with_context(|| format!("Could not query {} from `{}`", self.kind, self.table))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Could not read the {} query response", self.kind))?;

        if !status.is_success() {
            anyhow::bail!("Querying `{}` failed with {status}: {body}", self.table);
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Could not parse the rows returned for `{}`", self.table))
    }

    async fn delete_grades(&self, filter: &GradeFilter) -> Result<()> {
        let request = self.apply_filter(self.client.from(&self.table).delete(), filter);

        let response = request
            .execute()
            .await
            .with_context(|| format!("Could not delete {} from `{}`", self.kind, self.table))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Deleting from `{}` failed with {status}: {body}", self.table);
        }

        Ok(())
    }
}

/// In-memory grade table backing the integration tests and offline smoke
/// runs.
#[derive(Debug)]
pub struct MemoryGradeTable {
    /// Granularity this table stands in for.
    kind: GradeKind,
    /// Row storage.
    rows: Mutex<Vec<GradeRow>>,
}

impl MemoryGradeTable {
    /// Creates an empty table of the given kind.
    pub fn new(kind: GradeKind) -> Self {
        Self {
            kind,
            rows: Mutex::new(Vec::new()),
        }
    }

    /// Creates a table seeded with `rows`.
    pub fn with_rows(kind: GradeKind, rows: Vec<GradeRow>) -> Self {
        Self {
            kind,
            rows: Mutex::new(rows),
        }
    }

    /// Inserts a row.
    pub fn insert(&self, row: GradeRow) {
        self.rows.lock().expect("grade rows poisoned").push(row);
    }

    /// Number of rows currently held, ignoring any filter.
    pub fn len(&self) -> usize {
        self.rows.lock().expect("grade rows poisoned").len()
    }

    /// Whether the table holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GradeStore for MemoryGradeTable {
    fn kind(&self) -> GradeKind {
        self.kind
    }

    async fn query_grades(&self, filter: &GradeFilter) -> Result<Vec<GradeRow>> {
        let rows = self.rows.lock().expect("grade rows poisoned");
        Ok(rows
            .iter()
            .filter(|row| filter.matches(&row.course_id, row.modified))
            .cloned()
            .collect())
    }

    async fn delete_grades(&self, filter: &GradeFilter) -> Result<()> {
        let mut rows = self.rows.lock().expect("grade rows poisoned");
        rows.retain(|row| !filter.matches(&row.course_id, row.modified));
        Ok(())
    }
}
