use crate::models::FileRecord;
use crate::reconcile::ReconciliationEngine;
use anyhow::Context;
use remote::resolver::ServerInfoResolver;
use remote::ServerInfo;
use sqlx::SqlitePool;
use tracing::info;

pub struct SyncSummary {
    pub server: ServerInfo,
    pub merged: usize,
}

/// Merges a remote listing into the local mirror under one owner.
///
/// Records arrive with whatever owner the listing carried; it is forced to
/// the account this pass runs for, so a listing can never leak rows into
/// another account's namespace.
pub async fn import_listing(
    pool: &SqlitePool,
    owner: &str,
    records: Vec<FileRecord>,
) -> anyhow::Result<usize> {
    let engine = ReconciliationEngine::new(pool.clone());
    let mut merged = 0;
    for mut record in records {
        record.owner = owner.to_string();
        engine
            .merge(&record)
            .await
            .with_context(|| format!("failed to merge {}", record.remote_path))?;
        merged += 1;
    }
    info!(owner, merged, "listing imported");
    Ok(merged)
}

/// One sync pass: validate the server first, then reconcile the listing.
/// Any capability-discovery failure aborts the pass before a single row is
/// written.
pub async fn run_sync_pass(
    resolver: &ServerInfoResolver,
    pool: &SqlitePool,
    base_url: &str,
    owner: &str,
    records: Vec<FileRecord>,
) -> anyhow::Result<SyncSummary> {
    let server = resolver.get_server_info(base_url).await?;
    info!(url = %server.base_url, version = %server.version, "server validated");
    let merged = import_listing(pool, owner, records).await?;
    Ok(SyncSummary { server, merged })
}
