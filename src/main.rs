use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use leafcheck::{
    load_class_mapping, resolve_model, router, AppState, Args, Classifier, Labels, OnnxClassifier,
    PreprocessConfig, Processor, ReportOptions, Settings,
};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();
}

fn load_state(args: &Args) -> anyhow::Result<AppState> {
    let labels = match &args.labels {
        Some(path) => load_class_mapping(path).with_context(|| format!("reading labels from {}", path))?,
        None => Labels::default(),
    };
    info!(classes = labels.len(), "class labels ready");

    let model_path = resolve_model(&args.model).context("resolving model")?;
    let t = std::time::Instant::now();
    let classifier = OnnxClassifier::load(&model_path, args.cuda)
        .with_context(|| format!("loading model from {}", model_path.display()))?;
    info!(path = %model_path.display(), elapsed = ?t.elapsed(), "model loaded");
    let classifier: Arc<dyn Classifier> = Arc::new(classifier);

    let processor = Processor::new(
        PreprocessConfig::default()
            .with_size(args.input_size)
            .with_layout(args.layout),
    );
    let settings = Settings {
        softmax: args.softmax,
        min_plant_mass: args.min_plant_mass,
        report: ReportOptions {
            top_k: args.top_k,
            low_confidence: args.low_confidence,
        },
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
    };

    Ok(AppState::new(Some(classifier), processor, labels, settings))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {}", e);
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    info!("leafcheck v{}", env!("CARGO_PKG_VERSION"));
    // No model, no service.
    let state = match load_state(&args) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("failed to start: {:#}", e);
            std::process::exit(1);
        }
    };

    let app = router(state);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid host/port")?;
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
