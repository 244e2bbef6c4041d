use chrono::NaiveDateTime;
use gradectl::grades::{
    filter::{DATE_FORMAT, GradeFilter},
    reset::{self, OperationMode, ResetOutcome, ResetPlan},
    store::{GradeKind, GradeRow, MemoryGradeTable},
};

const DEMO: &str = "course-v1:edX+DemoX+2020";
const OTHER: &str = "course-v1:edX+OtherX+2020";

fn ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT).expect("test timestamp")
}

fn row(course: &str, modified: &str) -> GradeRow {
    GradeRow {
        course_id: course.to_string(),
        modified:  ts(modified),
    }
}

fn filter_for(course: &str) -> GradeFilter {
    GradeFilter::for_courses(vec![course.parse().expect("test course key")])
}

/// Subsection table with three DemoX rows inside January 2020, one outside,
/// and one row for a different course.
fn seeded_subsection() -> MemoryGradeTable {
    MemoryGradeTable::with_rows(GradeKind::Subsection, vec![
        row(DEMO, "2020-01-01 00:00"),
        row(DEMO, "2020-01-15 12:30"),
        row(DEMO, "2020-02-01 00:00"),
        row(DEMO, "2020-03-10 09:00"),
        row(OTHER, "2020-01-20 08:15"),
    ])
}

/// Course table with one DemoX row inside January 2020 and one row for a
/// different course.
fn seeded_course() -> MemoryGradeTable {
    MemoryGradeTable::with_rows(GradeKind::Course, vec![
        row(DEMO, "2020-01-31 23:59"),
        row(OTHER, "2020-01-02 10:00"),
    ])
}

fn january_demo_plan(mode: OperationMode) -> ResetPlan {
    ResetPlan {
        mode,
        filter: filter_for(DEMO)
            .with_modified_start(ts("2020-01-01 00:00"))
            .with_modified_end(ts("2020-02-01 00:00")),
    }
}

#[tokio::test]
async fn dry_run_reports_counts_without_mutating() {
    let subsection = seeded_subsection();
    let course = seeded_course();
    let plan = january_demo_plan(OperationMode::DryRun);

    let outcome = reset::run(&plan, &subsection, &course)
        .await
        .expect("dry run");

    let ResetOutcome::DryRun(reports) = outcome else {
        panic!("dry-run plan must produce reports");
    };
    assert_eq!(reports.len(), 2);

    assert_eq!(reports[0].kind, GradeKind::Subsection);
    assert_eq!(reports[0].total, 3);
    assert_eq!(reports[0].per_course.get(DEMO), Some(&3));
    assert_eq!(reports[0].per_course.get(OTHER), None);

    assert_eq!(reports[1].kind, GradeKind::Course);
    assert_eq!(reports[1].total, 1);
    assert_eq!(reports[1].per_course.get(DEMO), Some(&1));

    assert_eq!(subsection.len(), 5);
    assert_eq!(course.len(), 2);
}

#[tokio::test]
async fn dry_run_is_idempotent() {
    let subsection = seeded_subsection();
    let course = seeded_course();
    let plan = january_demo_plan(OperationMode::DryRun);

    let first = reset::run(&plan, &subsection, &course).await.expect("first run");
    let second = reset::run(&plan, &subsection, &course).await.expect("second run");

    assert_eq!(first, second);
}

#[tokio::test]
async fn dry_run_groups_rows_per_course() {
    let subsection = seeded_subsection();
    let report = reset::query_grades(&subsection, &GradeFilter::all_courses())
        .await
        .expect("query");

    assert_eq!(report.total, 5);
    assert_eq!(report.per_course.len(), 2);
    assert_eq!(report.per_course.get(DEMO), Some(&4));
    assert_eq!(report.per_course.get(OTHER), Some(&1));
}

#[tokio::test]
async fn delete_is_scoped_to_courses_and_date_range() {
    let subsection = seeded_subsection();
    let course = seeded_course();
    let plan = january_demo_plan(OperationMode::Delete);

    let outcome = reset::run(&plan, &subsection, &course).await.expect("delete");

    assert_eq!(
        outcome,
        ResetOutcome::Deleted(vec![(GradeKind::Subsection, 3), (GradeKind::Course, 1)])
    );

    // The out-of-range DemoX row and the OtherX row survive.
    let survivors = reset::query_grades(&subsection, &GradeFilter::all_courses())
        .await
        .expect("query survivors");
    assert_eq!(survivors.total, 2);
    assert_eq!(survivors.per_course.get(DEMO), Some(&1));
    assert_eq!(survivors.per_course.get(OTHER), Some(&1));

    let course_survivors = reset::query_grades(&course, &GradeFilter::all_courses())
        .await
        .expect("query survivors");
    assert_eq!(course_survivors.total, 1);
    assert_eq!(course_survivors.per_course.get(OTHER), Some(&1));
}

#[tokio::test]
async fn delete_all_courses_empties_both_kinds() {
    let subsection = seeded_subsection();
    let course = seeded_course();
    let plan = ResetPlan {
        mode:   OperationMode::Delete,
        filter: GradeFilter::all_courses(),
    };

    let outcome = reset::run(&plan, &subsection, &course).await.expect("delete");
    assert_eq!(
        outcome,
        ResetOutcome::Deleted(vec![(GradeKind::Subsection, 5), (GradeKind::Course, 2)])
    );
    assert!(subsection.is_empty());
    assert!(course.is_empty());

    // A follow-up dry run over everything reports zero for both kinds.
    let dry = ResetPlan {
        mode:   OperationMode::DryRun,
        filter: GradeFilter::all_courses(),
    };
    let ResetOutcome::DryRun(reports) = reset::run(&dry, &subsection, &course)
        .await
        .expect("dry run")
    else {
        panic!("dry-run plan must produce reports");
    };
    assert_eq!(reports[0].total, 0);
    assert_eq!(reports[1].total, 0);
    assert!(reports[0].per_course.is_empty());
    assert!(reports[1].per_course.is_empty());
}

#[tokio::test]
async fn delete_without_date_bounds_keeps_other_courses() {
    let subsection = seeded_subsection();
    let deleted = reset::delete_grades(&subsection, &filter_for(DEMO))
        .await
        .expect("delete");

    assert_eq!(deleted, 4);
    assert_eq!(subsection.len(), 1);
    let remaining = reset::query_grades(&subsection, &GradeFilter::all_courses())
        .await
        .expect("query");
    assert_eq!(remaining.per_course.get(OTHER), Some(&1));
}

#[tokio::test]
async fn legacy_keys_filter_their_own_rows() {
    let legacy = "edX/LegacyX/2016";
    let subsection = MemoryGradeTable::with_rows(GradeKind::Subsection, vec![
        row(legacy, "2016-09-01 08:00"),
        row(DEMO, "2016-09-01 08:00"),
    ]);

    let deleted = reset::delete_grades(&subsection, &filter_for(legacy))
        .await
        .expect("delete");

    assert_eq!(deleted, 1);
    assert_eq!(subsection.len(), 1);
}
