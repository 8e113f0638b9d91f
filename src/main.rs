mod app;
mod artifact;
mod event;
mod executor;
mod lab;
mod session;
mod workspace;

use app::BitLabApp;
use eframe::egui;
use executor::ExecutionClient;
use std::sync::mpsc;
use workspace::drafts::{default_drafts_path, FileDraftStore};

const DEFAULT_API_URL: &str = "http://localhost:5000/api";

fn api_base_url() -> String {
    std::env::var("BITLAB_API_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("bitlab-runtime")
        .build()?;

    let base_url = api_base_url();
    log::info!("execution boundary at {base_url}");

    let executor = ExecutionClient::new(base_url, runtime.handle().clone(), tx.clone());
    executor.start();

    let drafts = Box::new(FileDraftStore::open(default_drafts_path()));
    let app = BitLabApp::new(rx, executor, drafts);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "BitLab",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
