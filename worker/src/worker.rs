use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use common::{
    engine, ArtifactStore, Directive, FinishedMapRequest, FinishedReduceRequest, MapAssignment,
    ReduceAssignment, Workload,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::CoordinatorClient;

#[derive(Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub coordinator_url: String,
    pub workload: Workload,
    pub output_dir: PathBuf,
    /// Pausa después de un `wait` o de un pedido de tarea fallido.
    pub wait: Duration,
    pub request_timeout: Duration,
    /// Pedidos fallidos seguidos tras los cuales se da al coordinador por caído.
    pub max_consecutive_failures: u32,
}

/// Cómo terminó un loop de pedidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEnd {
    /// El coordinador respondió `exit`.
    Exited,
    /// Demasiados pedidos seguidos sin respuesta.
    Unreachable,
}

/// Loop principal del worker: tareas map hasta recibir `exit`, después tareas
/// reduce hasta recibir `exit`.
///
/// Cualquier falla al leer o publicar un artefacto termina el proceso con
/// error; el coordinador recupera la tarea con su timer de reencolado.
pub async fn run(config: WorkerConfig) -> Result<()> {
    let client = CoordinatorClient::new(&config.coordinator_url, config.request_timeout)
        .context("no se pudo crear el cliente http")?;
    let store = ArtifactStore::open(&config.output_dir)?;

    info!(
        "worker {} consultando a {} (salida en {})",
        config.worker_id,
        client.base_url(),
        store.root().display()
    );

    if map_loop(&config, &client, &store).await? == LoopEnd::Unreachable {
        warn!("coordinador inalcanzable en la fase map, saliendo");
        return Ok(());
    }
    info!("terminó la fase map, pasando a tareas reduce");

    if reduce_loop(&config, &client, &store).await? == LoopEnd::Unreachable {
        warn!("coordinador inalcanzable en la fase reduce, saliendo");
        return Ok(());
    }
    info!("worker {} terminó", config.worker_id);
    Ok(())
}

async fn map_loop(
    config: &WorkerConfig,
    client: &CoordinatorClient,
    store: &ArtifactStore,
) -> Result<LoopEnd> {
    let mut failures = 0u32;

    loop {
        let Some(resp) = client.get_map_task().await else {
            failures += 1;
            if failures >= config.max_consecutive_failures {
                return Ok(LoopEnd::Unreachable);
            }
            sleep(config.wait).await;
            continue;
        };
        failures = 0;

        match (resp.directive, resp.task) {
            (Directive::Process, Some(task)) => {
                let ordinal = task.map_ordinal;
                let intermediate_ids = execute_map(config.workload, store.clone(), task).await?;

                let report = FinishedMapRequest {
                    map_ordinal: ordinal,
                    intermediate_ids,
                };
                if !client.finished_map_task(&report).await {
                    warn!("el reporte de map {} no fue aceptado", ordinal);
                }
            }
            (Directive::Process, None) => {
                warn!("directiva process sin tarea map, se ignora");
                sleep(config.wait).await;
            }
            (Directive::Wait, _) => {
                debug!("no hay tareas map, esperando");
                sleep(config.wait).await;
            }
            (Directive::Exit, _) => return Ok(LoopEnd::Exited),
        }
    }
}

async fn reduce_loop(
    config: &WorkerConfig,
    client: &CoordinatorClient,
    store: &ArtifactStore,
) -> Result<LoopEnd> {
    let mut failures = 0u32;

    loop {
        let Some(resp) = client.get_reduce_task().await else {
            failures += 1;
            if failures >= config.max_consecutive_failures {
                return Ok(LoopEnd::Unreachable);
            }
            sleep(config.wait).await;
            continue;
        };
        failures = 0;

        match (resp.directive, resp.task) {
            (Directive::Process, Some(task)) => {
                let ordinal = task.reduce_ordinal;
                let output_id = execute_reduce(config.workload, store.clone(), task).await?;

                let report = FinishedReduceRequest {
                    reduce_ordinal: ordinal,
                    output_id,
                };
                if !client.finished_reduce_task(&report).await {
                    warn!("el reporte de reduce {} no fue aceptado", ordinal);
                }
            }
            (Directive::Process, None) => {
                warn!("directiva process sin tarea reduce, se ignora");
                sleep(config.wait).await;
            }
            (Directive::Wait, _) => {
                debug!("no hay tareas reduce, esperando");
                sleep(config.wait).await;
            }
            (Directive::Exit, _) => return Ok(LoopEnd::Exited),
        }
    }
}

async fn execute_map(
    workload: Workload,
    store: ArtifactStore,
    task: MapAssignment,
) -> Result<Vec<String>> {
    info!("corriendo map {} sobre {}", task.map_ordinal, task.input_id);

    let ordinal = task.map_ordinal;
    let ids = tokio::task::spawn_blocking(move || {
        engine::run_map_task(
            &store,
            &workload,
            &task.input_id,
            task.map_ordinal,
            task.n_reduce,
        )
    })
    .await
    .context("la tarea map hizo panic")?
    .with_context(|| format!("falló map {}", ordinal))?;

    Ok(ids)
}

async fn execute_reduce(
    workload: Workload,
    store: ArtifactStore,
    task: ReduceAssignment,
) -> Result<String> {
    info!(
        "corriendo reduce {} sobre {} inputs",
        task.reduce_ordinal,
        task.input_ids.len()
    );

    let ordinal = task.reduce_ordinal;
    let output_id = tokio::task::spawn_blocking(move || {
        engine::run_reduce_task(&store, &workload, task.reduce_ordinal, &task.input_ids)
    })
    .await
    .context("la tarea reduce hizo panic")?
    .with_context(|| format!("falló reduce {}", ordinal))?;

    Ok(output_id)
}
