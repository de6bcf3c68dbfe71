pub mod salary;
pub mod skills;

pub use salary::{SalaryRange, estimate_salary_range};
pub use skills::{find_potential_matches, normalize_skill, parse_job_skills};
