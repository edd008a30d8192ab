use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::app::AppState;

const GC_INTERVAL: Duration = Duration::from_secs(5 * 60);
const EXPIRY_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically runs a GC pass over the blobstore. Owned by the process
/// entry point, not fire-and-forget (SPEC_FULL.md §5.1).
pub async fn run_gc_worker(app: AppState, cancel: CancellationToken) {
    let ctx = app.anonymous_context();
    let mut ticker = tokio::time::interval(GC_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                slog::info!(ctx.logger(), "gc worker shutting down");
                return;
            }
            _ = ticker.tick() => {
                let store = app.content_store().raw().as_ref();
                let references = app.metadata().as_ref();
                match blobstore::run_gc_pass(&ctx, store, references, "blobs/").await {
                    Ok(outcome) => slog::info!(ctx.logger(), "gc pass complete"; "scanned" => outcome.scanned, "deleted" => outcome.deleted),
                    Err(e) => slog::error!(ctx.logger(), "gc pass failed"; "error" => %e),
                }
            }
        }
    }
}

/// Periodically reaps expired multipart upload sessions, deleting their
/// committed part blobs directly (they never fall under the `"blobs/"`
/// prefix the GC worker scans, so nothing else will ever reclaim them).
pub async fn run_expiry_worker(app: AppState, cancel: CancellationToken) {
    let ctx = app.anonymous_context();
    let mut ticker = tokio::time::interval(EXPIRY_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let expired = app.content_store().uploads().expired_upload_ids();
                for upload_id in &expired {
                    app.content_store().reap_expired_upload(&ctx, upload_id).await;
                }
                if !expired.is_empty() {
                    slog::debug!(ctx.logger(), "reaped expired uploads"; "count" => expired.len());
                }
            }
        }
    }
}
