use tokio::time::sleep;
use tracing::debug;

use common::{MapTask, ReduceOrdinal};

use crate::state::Coordinator;

/// Arma el timer de reencolado de una tarea map recién repartida.
///
/// El timer duerme el plazo sin tocar el coordinador y después toma el lock
/// una vez para devolver la tarea a la cola si nadie la reportó terminada.
/// Nunca avisa al worker que quizás la sigue corriendo.
pub fn schedule_map_requeue(coordinator: Coordinator, task: MapTask) {
    let delay = coordinator.grace_period();
    tokio::spawn(async move {
        sleep(delay).await;
        let ordinal = task.ordinal;
        if !coordinator.requeue_map_task(task) {
            debug!("map {} ya terminó, nada que reencolar", ordinal);
        }
    });
}

/// Ver [`schedule_map_requeue`].
pub fn schedule_reduce_requeue(coordinator: Coordinator, ordinal: ReduceOrdinal) {
    let delay = coordinator.grace_period();
    tokio::spawn(async move {
        sleep(delay).await;
        if !coordinator.requeue_reduce_task(ordinal) {
            debug!("reduce {} ya terminó, nada que reencolar", ordinal);
        }
    });
}
