use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::schema;
use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "candidates table",
        sql: schema::CANDIDATES_DDL,
    },
    Migration {
        id: 2,
        description: "jobs table",
        sql: schema::JOBS_DDL,
    },
    Migration {
        id: 3,
        description: "applications table with unique candidate/job pair",
        sql: schema::APPLICATIONS_DDL,
    },
    Migration {
        id: 4,
        description: "analysis queue with lease columns",
        sql: schema::ANALYSIS_QUEUE_DDL,
    },
    Migration {
        id: 5,
        description: "queue control row",
        sql: schema::QUEUE_CONTROL_DDL,
    },
    Migration {
        id: 6,
        description: "queue and application indexes",
        sql: schema::QUEUE_INDEXES_DDL,
    },
];

const BOOTSTRAP_SQL: &str = r#"
CREATE SCHEMA IF NOT EXISTS recruit;

CREATE TABLE IF NOT EXISTS recruit.schema_migrations (
    id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// Apply pending in-code migrations. Idempotent; already-applied ids are
/// recorded in `recruit.schema_migrations` and skipped.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;

    client.batch_execute(BOOTSTRAP_SQL).await?;

    for migration in MIGRATIONS {
        let applied = client
            .query_opt(
                "SELECT id FROM recruit.schema_migrations WHERE id = $1",
                &[&migration.id],
            )
            .await?;
        if applied.is_some() {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO recruit.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(id = migration.id, description = migration.description, "applied migration");
    }

    Ok(())
}
