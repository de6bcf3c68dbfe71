pub mod analysis;
pub mod api;
pub mod db;
pub mod logging;
pub mod matching;
pub mod queue;
pub mod retry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Commonly used data models for the analysis pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub skills: Vec<String>,
    pub years_of_experience: Option<i32>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub languages: Vec<String>,
    pub professional_status: Option<String>,
    pub employment_status: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub availability_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub position: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPosting {
    pub id: Option<i64>,
    pub company_id: Option<i64>,
    pub title: Option<String>,
    pub requirements: JobRequirements,
    pub application_ids: Vec<i64>,
}

/// Requirement block of a job posting. `hard_skills` keeps the source
/// comma-separated form; split it with `matching::parse_job_skills`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub education_level: Option<String>,
    pub field_of_study: Option<String>,
    pub years_experience_required: Option<i32>,
    pub experience_domain: Option<String>,
    pub hard_skills: Option<String>,
    pub soft_skills: Option<String>,
    pub languages: Option<String>,
}

impl Candidate {
    /// Degrees joined for salary estimation ("Master en ..., Licence en ...").
    pub fn education_summary(&self) -> String {
        self.education
            .iter()
            .filter_map(|entry| entry.degree.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
