//! Transaction helpers for the Postgres repositories.

use anyhow::Context;
use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

/// Begin a new database transaction.
pub async fn begin_transaction(db: &PgPool) -> anyhow::Result<PgTransaction<'_>> {
    db.begin().await.context("begin transaction")
}

/// Commit a transaction.
pub async fn commit_transaction(tx: PgTransaction<'_>) -> anyhow::Result<()> {
    tx.commit().await.context("commit transaction")
}

/// Roll back a transaction. Used when a guarded write turns out to be stale.
pub async fn rollback_transaction(tx: PgTransaction<'_>) -> anyhow::Result<()> {
    tx.rollback().await.context("rollback transaction")
}
