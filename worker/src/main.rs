use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use worker::WorkerConfig;

#[derive(Parser, Debug)]
#[command(name = "mr-worker")]
#[command(about = "Corre las tareas map y reduce que reparte el coordinador")]
struct Args {
    /// URL base del canal de control del coordinador.
    #[arg(long, env = "MASTER_URL", default_value = "http://localhost:8080")]
    coordinator_url: String,

    /// Par map/reduce incluido a correr (`wc` o `indexer`).
    #[arg(long, env = "MR_WORKLOAD", default_value = "wc")]
    workload: String,

    /// Directorio donde se escriben los artefactos intermedios y de salida.
    #[arg(long, env = "MR_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, env = "MR_WAIT_MS", default_value_t = 1000)]
    wait_ms: u64,

    #[arg(long, default_value_t = 5)]
    request_timeout_secs: u64,

    #[arg(long, env = "MR_MAX_FAILURES", default_value_t = 10)]
    max_consecutive_failures: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=info,mr_worker=info,common=info")),
        )
        .init();

    let args = Args::parse();
    let workload = common::workload::named(&args.workload)?;

    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let worker_id = format!("{}-{}", hostname, Uuid::new_v4().simple());
    info!("iniciando worker {} con workload {}", worker_id, args.workload);

    worker::run(WorkerConfig {
        worker_id,
        coordinator_url: args.coordinator_url,
        workload,
        output_dir: args.output_dir,
        wait: Duration::from_millis(args.wait_ms),
        request_timeout: Duration::from_secs(args.request_timeout_secs.max(1)),
        max_consecutive_failures: args.max_consecutive_failures.max(1),
    })
    .await
}
