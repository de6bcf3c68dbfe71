use deadpool_postgres::PoolError;
use tokio_postgres::types::Json;
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;

use crate::db::PgPool;
use crate::{Candidate, EducationEntry, ExperienceEntry};

#[derive(Debug, thiserror::Error)]
pub enum CandidateFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

fn row_to_candidate(row: &Row) -> Result<Candidate, CandidateFetchError> {
    let education: Option<Json<Vec<EducationEntry>>> = row.try_get("education")?;
    let experience: Option<Json<Vec<ExperienceEntry>>> = row.try_get("experience")?;

    Ok(Candidate {
        id: Some(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        skills: row.try_get("skills")?,
        years_of_experience: row.try_get("years_of_experience")?,
        education: education.map(|value| value.0).unwrap_or_default(),
        experience: experience.map(|value| value.0).unwrap_or_default(),
        languages: row.try_get("languages")?,
        professional_status: row.try_get("professional_status")?,
        employment_status: row.try_get("employment_status")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        availability_date: row.try_get("availability_date")?,
    })
}

#[instrument(skip(pool))]
pub async fn fetch_candidate(
    pool: &PgPool,
    id: i64,
) -> Result<Option<Candidate>, CandidateFetchError> {
    let client = pool.get().await?;

    let row = client
        .query_opt("SELECT * FROM recruit.candidates WHERE id = $1", &[&id])
        .await?;
    row.map(|r| row_to_candidate(&r)).transpose()
}
