use anyhow::{Context, Result};
use clap::Parser;
use tokio::{net::TcpListener, sync::{mpsc, oneshot}};
use tracing::info;
use tracing_subscriber::EnvFilter;

use coordinator::{
    config::{self, Args},
    launcher::{self, Outcome},
    AppState, Coordinator, SHUTDOWN_LINGER,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coordinator=info,mr_coordinator=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let inputs = config::expand_inputs(&args.inputs)?;

    let coordinator = Coordinator::new(inputs, args.n_reduce as usize, args.grace_period());
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();

    let state = AppState {
        coordinator: coordinator.clone(),
        fatal_tx,
    };

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("no se puede escuchar en {}", args.listen))?;
    info!("coordinador escuchando en {}", listener.local_addr()?);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(coordinator::serve(listener, state, async {
        let _ = shutdown_rx.await;
    }));

    let outcome = launcher::wait_until_done(&coordinator, args.poll_interval(), &mut fatal_rx).await;

    if matches!(outcome, Outcome::Done) {
        tokio::time::sleep(SHUTDOWN_LINGER).await;
    }
    let _ = shutdown_tx.send(());
    server.await?.context("falló el servidor del canal de control")?;

    match outcome {
        Outcome::Done => {
            info!("{:?}", coordinator.status());
            Ok(())
        }
        Outcome::Aborted(err) => Err(err).context("job abortado"),
        Outcome::Interrupted => Ok(()),
    }
}
