use crate::table::{RecordTable, Row};

pub const URL: &str = "URL";
pub const JOB_TITLE: &str = "Job_Title";
pub const QUALIFICATION: &str = "Qualification";
pub const JOB_DESCRIPTION: &str = "Job_Description";
pub const SKILLS: &str = "Skills";
pub const DESCRIPTION: &str = "Description";

/// A scraped detail page flattened into a fixed column layout.
pub trait JobRecord {
    const COLUMNS: &'static [&'static str];

    fn into_row(self) -> Row;

    /// Short name for progress logs.
    fn label(&self) -> Option<&str>;

    fn empty_table() -> RecordTable {
        RecordTable::new(Self::COLUMNS)
    }
}

/// Fields scraped from a mobile fresher detail page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FresherRecord {
    pub url: String,
    pub company: Option<String>,
    pub posting_time: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub job_description: Option<String>,
    pub industry: Option<String>,
    pub qualification: Option<String>,
    pub employment_type: Option<String>,
}

impl JobRecord for FresherRecord {
    const COLUMNS: &'static [&'static str] = &[
        URL,
        "Company",
        "Posting_Time",
        "Location",
        "Experience",
        "Salary",
        JOB_DESCRIPTION,
        "Industry",
        QUALIFICATION,
        "Employment_Type",
    ];

    fn into_row(self) -> Row {
        vec![
            Some(self.url),
            self.company,
            self.posting_time,
            self.location,
            self.experience,
            self.salary,
            self.job_description,
            self.industry,
            self.qualification,
            self.employment_type,
        ]
    }

    fn label(&self) -> Option<&str> {
        self.company.as_deref()
    }
}

/// Fields scraped from a desktop IT detail page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItRecord {
    pub url: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub posting_date: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub salary: Option<String>,
    pub industry: Option<String>,
    pub qualification: Option<String>,
    pub employment_type: Option<String>,
    pub skills: Option<String>,
    pub description: Option<String>,
}

impl JobRecord for ItRecord {
    const COLUMNS: &'static [&'static str] = &[
        URL,
        JOB_TITLE,
        "Company",
        "Posting_Date",
        "Location",
        "Experience",
        "Salary",
        "Industry",
        QUALIFICATION,
        "Employment_Type",
        SKILLS,
        DESCRIPTION,
    ];

    fn into_row(self) -> Row {
        vec![
            Some(self.url),
            self.job_title,
            self.company,
            self.posting_date,
            self.location,
            self.experience,
            self.salary,
            self.industry,
            self.qualification,
            self.employment_type,
            self.skills,
            self.description,
        ]
    }

    fn label(&self) -> Option<&str> {
        self.job_title.as_deref().or(self.company.as_deref())
    }
}
