//! `vn-sidecar` entry point.

use anyhow::Context;
use clap::Parser;

use vidnote_sidecar::{SidecarArgs, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = SidecarArgs::parse();
    let _log_guard = logging::init_tracing(args.log_dir.as_deref());

    vidnote_sidecar::run(args)
        .await
        .context("Sidecar failed")?;

    Ok(())
}
