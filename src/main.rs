mod app;
mod config;
mod error;
mod grid;
mod library;
mod models;
mod thumbnails;
mod ui;

use anyhow::Context;
use std::path::PathBuf;

use app::PhotopickApp;
use config::GalleryConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("photopick=info".parse()?),
        )
        .init();

    let library = std::env::args_os().nth(1).map(PathBuf::from);
    let config = GalleryConfig::load(library.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("photopick-io")
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let app = PhotopickApp::new(config, runtime.handle().clone());
    let code = app.run();
    runtime.shutdown_background();
    std::process::exit(code);
}
