#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # gradectl
//!
//! Batch maintenance for persisted learner grades. The only command,
//! `reset_grades`, reports or deletes the grade rows selected by a course
//! list (or every course) and an optional inclusive modified-date range.

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use gradectl::{
    config,
    grades::{
        reset::{self, ResetOptions},
        store::PostgrestGradeStore,
    },
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Report or delete persisted grade rows.
    ResetGrades(ResetOptions),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    let dry_run = long("dry_run")
        .help("Output what we're going to do, but don't actually do it. To actually delete, use --delete instead.")
        .switch();
    let delete = long("delete")
        .help("Actually perform the deletions. For a dry run, use --dry_run instead.")
        .switch();
    let courses = long("courses")
        .help("Reset persisted grades for the given course; repeat the flag for several courses.")
        .argument::<String>("COURSE_KEY")
        .many();
    let all_courses = long("all_courses")
        .help("Reset persisted grades for all courses.")
        .switch();
    let modified_start = long("modified_start")
        .help("Starting range for the modified date (inclusive): e.g. \"2016-08-23 16:43\".")
        .argument::<String>("DATETIME")
        .optional();
    let modified_end = long("modified_end")
        .help("Ending range for the modified date (inclusive): e.g. \"2016-12-23 16:43\".")
        .argument::<String>("DATETIME")
        .optional();

    let reset_grades = construct!(ResetOptions {
        dry_run,
        delete,
        courses,
        all_courses,
        modified_start,
        modified_end,
    })
    .to_options()
    .command("reset_grades")
    .help("Report or delete persisted learner grades")
    .map(Cmd::ResetGrades);

    construct!([reset_grades])
        .to_options()
        .descr("Batch maintenance for persisted learner grades")
        .run()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match options() {
        Cmd::ResetGrades(opts) => {
            let plan = opts.plan()?;

            let client = config::postgrest_client()
                .context("Supabase is not configured; set SUPABASE_URL and SUPABASE_ANON_KEY.")?;
            let subsection = PostgrestGradeStore::subsection(client.clone());
            let course = PostgrestGradeStore::course(client);

            reset::run(&plan, &subsection, &course).await?;
        }
    }

    Ok(())
}
