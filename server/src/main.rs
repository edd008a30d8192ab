use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use server::app::AppState;
use server::backend::AnyBlobstore;
use server::config::{load_config, Cli};
use server::logging::build_logger;
use server::{routes, workers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = build_logger(cli.verbose);
    let config = Arc::new(load_config(&cli)?);

    let blobstore = match &cli.blob_dir {
        Some(dir) => AnyBlobstore::File(blobstore::FileBlobstore::new(dir.clone())),
        None => AnyBlobstore::Mem(blobstore::MemBlobstore::new()),
    };

    let app = AppState::new(logger.clone(), config, blobstore);

    let cancel = CancellationToken::new();
    let gc_handle = tokio::spawn(workers::run_gc_worker(app.clone(), cancel.clone()));
    let expiry_handle = tokio::spawn(workers::run_expiry_worker(app.clone(), cancel.clone()));

    slog::info!(logger, "starting registry server"; "bind" => %cli.bind);
    gotham::plain::init_server(cli.bind, routes::router(app))
        .await
        .map_err(|()| anyhow::anyhow!("server exited with an error"))?;

    cancel.cancel();
    gc_handle.await.ok();
    expiry_handle.await.ok();
    Ok(())
}
