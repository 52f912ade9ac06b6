use regex::Regex;
use crate::extractor::collapse_whitespace;
use crate::record::{DESCRIPTION, JOB_DESCRIPTION, SKILLS};
use crate::table::RecordTable;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionParts {
    pub description: Option<String>,
    pub skills: Option<String>,
}

/// Splits a free-text job description into its responsibilities and skills segments.
pub struct DescriptionSplitter {
    responsibilities_regex: Regex,
    skills_regex: Regex,
}

impl DescriptionSplitter {
    pub fn new() -> Self {
        DescriptionSplitter {
            responsibilities_regex: Regex::new(
                r"(?i)Job Responsibilities(.*?)(Education Requirement|Skills|Skills & Competencies|$)",
            )
            .expect("responsibilities pattern"),
            skills_regex: Regex::new(r"(?i)(Skills & Competencies|Skills)(.*)").expect("skills pattern"),
        }
    }

    pub fn split(&self, text: &str) -> DescriptionParts {
        let text = collapse_whitespace(text);

        let description = self
            .responsibilities_regex
            .captures(&text)
            .and_then(|cap| cap.get(1))
            .and_then(|m| trimmed(m.as_str()));

        let skills = self
            .skills_regex
            .captures(&text)
            .and_then(|cap| cap.get(2))
            .and_then(|m| trimmed(m.as_str()));

        DescriptionParts { description, skills }
    }

    /// Adds `Skills` and `Description` columns derived from `Job_Description`.
    pub fn apply(&self, table: &mut RecordTable) {
        let blobs = table.column_values(JOB_DESCRIPTION);
        table.add_column(SKILLS);
        table.add_column(DESCRIPTION);
        for (row, blob) in blobs.into_iter().enumerate() {
            let parts = blob.map(|b| self.split(&b)).unwrap_or_default();
            table.set(row, SKILLS, parts.skills);
            table.set(row, DESCRIPTION, parts.description);
        }
    }
}

impl Default for DescriptionSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn trimmed(text: &str) -> Option<String> {
    let t = text.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_responsibilities_and_skills() {
        let parts = DescriptionSplitter::new().split("Job Responsibilities Build things. Skills Python, SQL");
        assert_eq!(parts.description.as_deref(), Some("Build things."));
        assert_eq!(parts.skills.as_deref(), Some("Python, SQL"));
    }

    #[test]
    fn test_no_markers_gives_nothing() {
        let parts = DescriptionSplitter::new().split("We are hiring freshers for many roles.");
        assert_eq!(parts, DescriptionParts::default());
    }

    #[test]
    fn test_markers_are_case_insensitive_and_stop_at_education() {
        let parts = DescriptionSplitter::new().split(
            "job responsibilities  Write   reports. education requirement B.Com SKILLS & COMPETENCIES Excel",
        );
        assert_eq!(parts.description.as_deref(), Some("Write reports."));
        assert_eq!(parts.skills.as_deref(), Some("Excel"));
    }

    #[test]
    fn test_responsibilities_run_to_end_without_terminator() {
        let parts = DescriptionSplitter::new().split("Intro. Job Responsibilities Answer calls");
        assert_eq!(parts.description.as_deref(), Some("Answer calls"));
        assert_eq!(parts.skills, None);
    }

    #[test]
    fn test_apply_adds_columns() {
        let mut table = RecordTable::new(&["URL", JOB_DESCRIPTION]);
        table.push_row(vec![Some("u1".into()), Some("Job Responsibilities Test. Skills Go".into())]);
        table.push_row(vec![Some("u2".into()), None]);

        DescriptionSplitter::new().apply(&mut table);
        assert_eq!(table.get(0, DESCRIPTION), Some("Test."));
        assert_eq!(table.get(0, SKILLS), Some("Go"));
        assert_eq!(table.get(1, DESCRIPTION), None);
        assert!(table.has_column(SKILLS));
    }
}
