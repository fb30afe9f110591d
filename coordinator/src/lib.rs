//! Coordinador de MapReduce: la máquina de estados que asigna tareas, sus
//! timers de reencolado y el canal de control HTTP con los workers.

use std::{future::Future, time::Duration};

use tokio::net::TcpListener;

pub mod config;
pub mod failover;
pub mod handlers;
pub mod launcher;
pub mod state;

pub use handlers::{build_router, AppState};
pub use state::{Coordinator, CoordinatorError};

/// Tiempo por defecto que una tarea asignada puede pasar sin reportar antes de reencolarla.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Cuánto sigue respondiendo `exit` el servidor después de terminar el job,
/// para que los workers ociosos salgan limpio.
pub const SHUTDOWN_LINGER: Duration = Duration::from_secs(2);

/// Sirve el canal de control en `listener` hasta que se resuelva `shutdown`.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
