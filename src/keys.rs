#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt, str::FromStr};

/// Prefix marking the modern course-key syntax.
const COURSE_V1_PREFIX: &str = "course-v1:";

/// An error raised when a course-key string does not parse.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not a valid course key")]
pub struct InvalidKeyError(pub String);

/// A parsed course identifier.
///
/// Two syntaxes are accepted: the modern `course-v1:<org>+<course>+<run>`
/// form and the legacy `<org>/<course>/<run>` form. Each field is non-empty
/// and limited to ASCII alphanumerics plus `.`, `_`, `~`, and `-`. The
/// `Display` form reproduces the syntax the key was parsed from, which is
/// also the value the grade tables store in their `course_id` column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CourseKey {
    /// Organization that offers the course.
    org:    String,
    /// Course code within the organization.
    course: String,
    /// Specific run of the course.
    run:    String,
    /// Whether the key was written in the legacy slash-separated syntax.
    legacy: bool,
}

impl CourseKey {
    /// Returns the organization field.
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Returns the course field.
    pub fn course(&self) -> &str {
        &self.course
    }

    /// Returns the run field.
    pub fn run(&self) -> &str {
        &self.run
    }

    /// Builds a key from already-validated fields.
    fn from_fields(fields: &[&str], legacy: bool) -> Self {
        Self {
            org: fields[0].to_string(),
            course: fields[1].to_string(),
            run: fields[2].to_string(),
            legacy,
        }
    }
}

/// Returns true when `field` is non-empty and every character is legal
/// inside a key field.
fn valid_field(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-'))
}

impl FromStr for CourseKey {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (body, separator, legacy) = match s.strip_prefix(COURSE_V1_PREFIX) {
            Some(rest) => (rest, '+', false),
            None => (s, '/', true),
        };

        let fields: Vec<&str> = body.split(separator).collect();
        if fields.len() != 3 || !fields.iter().copied().all(valid_field) {
            return Err(InvalidKeyError(s.to_string()));
        }

        Ok(Self::from_fields(&fields, legacy))
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.legacy {
            write!(f, "{}/{}/{}", self.org, self.course, self.run)
        } else {
            write!(f, "{COURSE_V1_PREFIX}{}+{}+{}", self.org, self.course, self.run)
        }
    }
}
