use flux_local::api::server::start_server;
use flux_local::config::AppConfig;
use flux_local::inference::image_gen::ImageEngine;
use flux_local::inference::InferenceRequest;
use flux_local::system::bootstrap;
use flux_local::system::optimizer::ExecutionConfig;

use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();

    let port: u16 = args
        .iter()
        .position(|a| a == "--port")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(7860);

    let models_dir_override = args
        .iter()
        .position(|a| a == "--models-dir")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    // Load config and make sure the volume layout exists
    let config = AppConfig::load(models_dir_override);
    if !config.ensure_dirs() {
        info!("continuing with partially created directories");
    }

    // One-shot environment tuning, then pick execution parameters for
    // whatever accelerator (if any) this host carries
    let flags = bootstrap::setup_environment();
    let exec = ExecutionConfig::detect();

    // Model load failure is the one startup error that must surface
    let mut engine = ImageEngine::load(config.clone(), flags, exec)?;

    // Inference channel
    let (inference_tx, mut inference_rx) = tokio::sync::mpsc::channel::<InferenceRequest>(16);

    // Single worker thread owns the engine: one generation in flight at a
    // time, requests queue on the channel
    std::thread::spawn(move || {
        while let Some(req) = inference_rx.blocking_recv() {
            match req {
                InferenceRequest::GenerateImage {
                    prompt,
                    negative_prompt,
                    steps,
                    cfg_scale,
                    lora_path,
                    response_tx,
                } => {
                    let res = engine.generate(
                        &prompt,
                        &negative_prompt,
                        steps,
                        cfg_scale,
                        lora_path.as_deref(),
                    );
                    let _ = response_tx.send(res);
                }
                InferenceRequest::Shutdown => break,
            }
        }
    });

    info!("starting Flux image server on port {}", port);
    start_server(port, inference_tx, config).await?;

    Ok(())
}
