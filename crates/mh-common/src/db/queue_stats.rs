use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::api::models::queue::QueueCounts;
use crate::db::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum QueueStatsError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

#[instrument(skip(pool))]
pub async fn fetch_queue_counts(pool: &PgPool) -> Result<QueueCounts, QueueStatsError> {
    let client = pool.get().await?;

    let row = client
        .query_one(
            "SELECT \
                COUNT(*) FILTER (WHERE state = 'waiting') AS waiting,\
                COUNT(*) FILTER (WHERE state = 'delayed') AS delayed,\
                COUNT(*) FILTER (WHERE state = 'active') AS active,\
                COUNT(*) FILTER (WHERE state = 'completed') AS completed,\
                COUNT(*) FILTER (WHERE state = 'failed') AS failed \
            FROM recruit.analysis_queue",
            &[],
        )
        .await?;

    Ok(QueueCounts {
        waiting: row.get("waiting"),
        delayed: row.get("delayed"),
        active: row.get("active"),
        completed: row.get("completed"),
        failed: row.get("failed"),
    })
}
