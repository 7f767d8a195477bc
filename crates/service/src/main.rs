mod config;
mod response;
mod routes;

use std::net::SocketAddr;
use std::process;
use std::sync::{Arc, Mutex};

use axum::Router;
use clap::Parser;

use emotion_core::analysis::infrastructure::analyzer_factory::create_analyzer;
use emotion_core::pipeline::emotion_invoker::EmotionInvoker;

use crate::config::ServiceConfig;
use crate::routes::{build_router, AppState};

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::parse();
    config.validate()?;

    // Built before the runtime exists: the remote backend's blocking HTTP
    // client must be created and dropped outside async context.
    let analyzer = create_analyzer(&config.analyzer.backend(), Some(log_download_progress))?;
    let invoker = Arc::new(Mutex::new(EmotionInvoker::new(
        analyzer,
        config.analyzer.options(),
        config.analyzer.face_selection,
    )));

    let state = AppState::new(
        Arc::clone(&invoker),
        config.upload_dir(),
        config.analysis_timeout(),
    );
    let app = build_router(state, config.max_upload_bytes);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve(app, config.addr()));
    drop(runtime);
    drop(invoker);
    served?;
    Ok(())
}

async fn serve(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

fn log_download_progress(downloaded: u64, total: u64) {
    if total > 0 && downloaded >= total {
        log::info!("Model download complete ({total} bytes)");
    }
}
