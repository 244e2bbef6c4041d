#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use chrono::NaiveDateTime;

use crate::keys::CourseKey;

/// Format accepted for `--modified_start` and `--modified_end` values.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parses a modified-date bound written in [`DATE_FORMAT`].
pub fn parse_modified(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
}

/// Row-selection predicate shared by reporting and deletion.
///
/// One value is built per run and handed to both grade kinds, so the rows a
/// dry run counts are exactly the rows a real run deletes. Backends either
/// evaluate [`GradeFilter::matches`] directly or translate the same three
/// fields into their query language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeFilter {
    /// Courses to touch; `None` selects every course.
    course_keys:    Option<Vec<CourseKey>>,
    /// Inclusive lower bound on the row's `modified` timestamp.
    modified_start: Option<NaiveDateTime>,
    /// Inclusive upper bound on the row's `modified` timestamp.
    modified_end:   Option<NaiveDateTime>,
}

impl GradeFilter {
    /// A filter selecting every row of every course.
    pub fn all_courses() -> Self {
        Self::default()
    }

    /// A filter restricted to the given courses.
    pub fn for_courses(keys: Vec<CourseKey>) -> Self {
        Self {
            course_keys: Some(keys),
            ..Self::default()
        }
    }

    /// Restricts the filter to rows modified at or after `start`.
    pub fn with_modified_start(mut self, start: NaiveDateTime) -> Self {
        self.modified_start = Some(start);
        self
    }

    /// Restricts the filter to rows modified at or before `end`.
    pub fn with_modified_end(mut self, end: NaiveDateTime) -> Self {
        self.modified_end = Some(end);
        self
    }

    /// Returns the course restriction, if any.
    pub fn course_keys(&self) -> Option<&[CourseKey]> {
        self.course_keys.as_deref()
    }

    /// Returns the inclusive lower modified bound, if any.
    pub fn modified_start(&self) -> Option<NaiveDateTime> {
        self.modified_start
    }

    /// Returns the inclusive upper modified bound, if any.
    pub fn modified_end(&self) -> Option<NaiveDateTime> {
        self.modified_end
    }

    /// Reference predicate: whether a row with this course id and modified
    /// timestamp falls inside the filter.
    pub fn matches(&self, course_id: &str, modified: NaiveDateTime) -> bool {
        if let Some(keys) = &self.course_keys {
            if !keys.iter().any(|key| key.to_string() == course_id) {
                return false;
            }
        }
        if let Some(start) = self.modified_start {
            if modified < start {
                return false;
            }
        }
        if let Some(end) = self.modified_end {
            if modified > end {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses a test timestamp in the command's own date format.
    fn ts(value: &str) -> NaiveDateTime {
        parse_modified(value).expect("test timestamp")
    }

    #[test]
    fn parses_command_date_format() {
        let parsed = parse_modified("2016-08-23 16:43").expect("valid date");
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2016-08-23 16:43");
    }

    #[test]
    fn rejects_other_date_formats() {
        assert!(parse_modified("2016-08-23").is_err());
        assert!(parse_modified("2016-08-23T16:43").is_err());
        assert!(parse_modified("23/08/2016 16:43").is_err());
        assert!(parse_modified("2016-13-40 16:43").is_err());
    }

    #[test]
    fn unrestricted_filter_matches_everything() {
        let filter = GradeFilter::all_courses();
        assert!(filter.matches("course-v1:edX+DemoX+2020", ts("2020-01-01 00:00")));
        assert!(filter.matches("anything at all", ts("1999-12-31 23:59")));
    }

    #[test]
    fn course_restriction_matches_canonical_string() {
        let key = "course-v1:edX+DemoX+2020".parse().expect("valid key");
        let filter = GradeFilter::for_courses(vec![key]);
        assert!(filter.matches("course-v1:edX+DemoX+2020", ts("2020-01-01 00:00")));
        assert!(!filter.matches("course-v1:edX+OtherX+2020", ts("2020-01-01 00:00")));
    }

    #[test]
    fn modified_bounds_are_inclusive() {
        let filter = GradeFilter::all_courses()
            .with_modified_start(ts("2020-01-01 00:00"))
            .with_modified_end(ts("2020-02-01 00:00"));

        assert!(filter.matches("c", ts("2020-01-01 00:00")));
        assert!(filter.matches("c", ts("2020-02-01 00:00")));
        assert!(filter.matches("c", ts("2020-01-15 12:30")));
        assert!(!filter.matches("c", ts("2019-12-31 23:59")));
        assert!(!filter.matches("c", ts("2020-02-01 00:01")));
    }
}
