use serde::{Deserialize, Serialize};

/// Monthly salary estimate for the Tunisian market, in TND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: i32,
    pub max: i32,
    pub currency: String,
}

const MARKET_CAP: i32 = 5000;

const HIGH_DEMAND_SKILLS: &[&str] = &[
    "javascript",
    "typescript",
    "react",
    "angular",
    "vue",
    "node",
    "python",
    "java",
    "devops",
    "cloud",
    "aws",
    "azure",
    "docker",
    "kubernetes",
    "data science",
    "machine learning",
    "ai",
    "blockchain",
    "security",
    "mongodb",
    "mongoose",
    "nosql",
];

fn base_range_for_years(years: i32) -> (i32, i32) {
    match years {
        y if y >= 7 => (4000, 5000),
        y if y >= 4 => (2500, 4000),
        y if y >= 2 => (1500, 2500),
        _ => (800, 1500),
    }
}

/// Salary band estimated from the candidate profile and the posting title.
/// Experience picks the base band; education, in-demand skills and seniority
/// keywords in the title shift it, capped at the market ceiling.
pub fn estimate_salary_range(
    years_of_experience: i32,
    skills: &[String],
    education: &str,
    job_title: &str,
) -> SalaryRange {
    let (mut min, mut max) = base_range_for_years(years_of_experience);

    let education = education.to_lowercase();
    if education.contains("phd") || education.contains("doctorat") {
        min += 500;
        max += 1000;
    } else if education.contains("master") || education.contains("mba") {
        min += 300;
        max += 500;
    }

    let high_demand_count = skills
        .iter()
        .filter(|skill| {
            let skill = skill.to_lowercase();
            HIGH_DEMAND_SKILLS.iter().any(|hot| skill.contains(hot))
        })
        .count();

    if high_demand_count >= 3 {
        min += 400;
        max += 800;
    } else if high_demand_count >= 1 {
        min += 200;
        max += 400;
    }

    let title = job_title.to_lowercase();
    if title.contains("manager") || title.contains("director") {
        min += 800;
        max += 1500;
    } else if title.contains("lead") || title.contains("senior") {
        min += 300;
        max += 600;
    }

    let max = max.min(MARKET_CAP);

    SalaryRange {
        min: min.min(max),
        max,
        currency: "TND".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn junior_with_no_signals_gets_base_band() {
        let range = estimate_salary_range(0, &[], "", "Développeur");

        assert_eq!(range.min, 800);
        assert_eq!(range.max, 1500);
        assert_eq!(range.currency, "TND");
    }

    #[test]
    fn experience_moves_through_bands() {
        assert_eq!(estimate_salary_range(2, &[], "", "").min, 1500);
        assert_eq!(estimate_salary_range(4, &[], "", "").min, 2500);
        assert_eq!(estimate_salary_range(7, &[], "", "").min, 4000);
    }

    #[test]
    fn master_and_in_demand_skills_raise_the_band() {
        let range = estimate_salary_range(
            2,
            &skills(&["React", "Node.js", "Docker"]),
            "Master en Informatique",
            "Développeur Full Stack",
        );

        // mid band 1500-2500, +300/+500 master, +400/+800 three hot skills
        assert_eq!(range.min, 2200);
        assert_eq!(range.max, 3800);
    }

    #[test]
    fn estimate_never_exceeds_market_cap() {
        let range = estimate_salary_range(
            10,
            &skills(&["python", "aws", "kubernetes", "security"]),
            "PhD",
            "Engineering Director",
        );

        assert!(range.max <= 5000);
        assert!(range.min <= range.max);
    }

    #[test]
    fn manager_title_outranks_senior_bump() {
        let senior = estimate_salary_range(5, &[], "", "Senior Developer");
        let manager = estimate_salary_range(5, &[], "", "Engineering Manager");

        assert!(manager.min > senior.min);
    }
}
