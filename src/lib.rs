#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # gradectl
//!
//! Batch maintenance for the persisted learner grades produced by a grading
//! pipeline. The grades themselves are written by that pipeline into two
//! Supabase-hosted tables (one row per learner per graded subsection, one
//! row per learner per course); this crate only reads and deletes them.
//!
//! The single `reset_grades` command either reports (`--dry_run`) or
//! removes (`--delete`) the rows selected by a course list (or every
//! course) and an optional inclusive modified-date range.

/// Runtime configuration sourced from the environment
pub mod config;
/// For all things related to persisted grades
pub mod grades;
/// Course-key parsing and validation
pub mod keys;
