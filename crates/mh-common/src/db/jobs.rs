use deadpool_postgres::PoolError;
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;

use crate::db::PgPool;
use crate::{JobPosting, JobRequirements};

#[derive(Debug, thiserror::Error)]
pub enum JobFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

fn row_to_job(row: &Row) -> Result<JobPosting, JobFetchError> {
    Ok(JobPosting {
        id: Some(row.try_get("id")?),
        company_id: row.try_get("company_id")?,
        title: row.try_get("title")?,
        requirements: JobRequirements {
            education_level: row.try_get("education_level")?,
            field_of_study: row.try_get("field_of_study")?,
            years_experience_required: row.try_get("years_experience_required")?,
            experience_domain: row.try_get("experience_domain")?,
            hard_skills: row.try_get("hard_skills")?,
            soft_skills: row.try_get("soft_skills")?,
            languages: row.try_get("languages")?,
        },
        application_ids: row.try_get("application_ids")?,
    })
}

#[instrument(skip(pool))]
pub async fn fetch_job(pool: &PgPool, id: i64) -> Result<Option<JobPosting>, JobFetchError> {
    let client = pool.get().await?;

    let row = client
        .query_opt("SELECT * FROM recruit.jobs WHERE id = $1", &[&id])
        .await?;
    row.map(|r| row_to_job(&r)).transpose()
}
