//! Loop de control del proceso coordinador: consulta `done()` hasta que el
//! job termina, o corta antes ante un error fatal de protocolo o un Ctrl-C.

use std::time::Duration;

use tokio::{sync::mpsc, time::sleep};
use tracing::{error, info};

use crate::state::{Coordinator, CoordinatorError};

#[derive(Debug)]
pub enum Outcome {
    Done,
    Aborted(CoordinatorError),
    Interrupted,
}

pub async fn wait_until_done(
    coordinator: &Coordinator,
    poll_interval: Duration,
    fatal_rx: &mut mpsc::UnboundedReceiver<CoordinatorError>,
) -> Outcome {
    loop {
        if coordinator.done() {
            info!("job terminado");
            return Outcome::Done;
        }

        tokio::select! {
            _ = sleep(poll_interval) => {}
            Some(err) = fatal_rx.recv() => {
                error!("abortando: {}", err);
                return Outcome::Aborted(err);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrumpido");
                return Outcome::Interrupted;
            }
        }
    }
}
