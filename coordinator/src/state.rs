// coordinator/src/state.rs

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use common::{
    artifact::parse_intermediate_id, FinishedMapRequest, FinishedReduceRequest, JobPhase,
    JobStatusReport, MapAssignment, MapOrdinal, MapPhase, MapTask, MapTaskResponse,
    ReduceAssignment, ReduceOrdinal, ReducePhase, ReduceTaskResponse,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::failover;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Un worker reportó un identificador intermedio que no es
    /// `mr-<map>-<bucket>` de esa misma tarea con un bucket válido. Nunca es
    /// transitorio.
    #[error("id intermedio inválido `{0}`")]
    BadIntermediateId(String),

    #[error("tarea map desconocida {0}")]
    UnknownMapTask(MapOrdinal),

    #[error("tarea reduce desconocida {0}")]
    UnknownReduceTask(ReduceOrdinal),
}

impl CoordinatorError {
    /// Si hay que abortar el job en vez de solo rechazar el pedido.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoordinatorError::BadIntermediateId(_))
    }
}

/// Todo lo que sabe el coordinador del job. Solo se toca con el lock de
/// [`Coordinator`] tomado.
#[derive(Debug)]
pub struct CoordinatorState {
    pub n_reduce: usize,
    pub map_phase: MapPhase,
    pub reduce_phase: ReducePhase,
    /// Implica `reduce_phase.is_done`.
    pub job_done: bool,

    pub requeued: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    fn mark_job_done(&mut self) {
        if !self.job_done {
            self.job_done = true;
            self.finished_at = Some(Utc::now());
            info!("job terminado");
        }
    }
}

/// Handle al estado compartido del coordinador. Clonarlo es barato; todos los
/// clones hablan con el mismo job.
#[derive(Clone)]
pub struct Coordinator {
    state: Arc<Mutex<CoordinatorState>>,
    grace_period: Duration,
}

impl Coordinator {
    pub fn new<I, S>(inputs: I, n_reduce: usize, grace_period: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let map_phase = MapPhase::new(inputs);
        info!(
            "job nuevo: {} tareas map, {} tareas reduce, plazo {:?}",
            map_phase.total_tasks, n_reduce, grace_period
        );

        let state = CoordinatorState {
            n_reduce,
            map_phase,
            reduce_phase: ReducePhase::new(n_reduce),
            job_done: false,
            requeued: 0,
            started_at: Utc::now(),
            finished_at: None,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            grace_period,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    // Nunca se mantiene a través de un await ni de I/O.
    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /* ---------------- map ---------------- */

    pub fn get_map_task(&self) -> MapTaskResponse {
        let (response, dispatched) = {
            let mut st = self.lock();
            match st.map_phase.take_next() {
                Some(task) => {
                    info!("asignando map {} ({})", task.ordinal, task.input_id);
                    let assignment = MapAssignment {
                        input_id: task.input_id.clone(),
                        map_ordinal: task.ordinal,
                        n_reduce: st.n_reduce,
                    };
                    (MapTaskResponse::process(assignment), Some(task))
                }
                None if st.map_phase.is_done => (MapTaskResponse::exit(), None),
                None => (MapTaskResponse::wait(), None),
            }
        };

        if let Some(task) = dispatched {
            failover::schedule_map_requeue(self.clone(), task);
        }
        response
    }

    /// Lo llama el timer de reencolado cuando se vence el plazo de `task`.
    pub fn requeue_map_task(&self, task: MapTask) -> bool {
        let mut st = self.lock();
        let ordinal = task.ordinal;
        let requeued = st.map_phase.requeue(task);
        if requeued {
            st.requeued += 1;
            warn!(
                "map {} no terminó en {:?}, reencolando",
                ordinal, self.grace_period
            );
        }
        requeued
    }

    pub fn finished_map_task(&self, req: &FinishedMapRequest) -> Result<(), CoordinatorError> {
        let mut st = self.lock();

        if !st.map_phase.contains(req.map_ordinal) {
            return Err(CoordinatorError::UnknownMapTask(req.map_ordinal));
        }

        // validar todo antes de tocar el estado
        let mut buckets = Vec::with_capacity(req.intermediate_ids.len());
        for id in &req.intermediate_ids {
            let bucket = parse_intermediate_id(id)
                .ok()
                .filter(|(map, bucket)| *map == req.map_ordinal && st.reduce_phase.contains(*bucket))
                .map(|(_, bucket)| bucket)
                .ok_or_else(|| CoordinatorError::BadIntermediateId(id.clone()))?;
            buckets.push(bucket);
        }

        let was_done = st.map_phase.is_done;
        if !st.map_phase.mark_completed(req.map_ordinal) {
            info!("map {} reportada de nuevo", req.map_ordinal);
        }
        for (bucket, id) in buckets.into_iter().zip(&req.intermediate_ids) {
            st.reduce_phase.add_input(bucket, id.clone());
        }
        info!("map {} terminada", req.map_ordinal);

        if st.map_phase.is_done && !was_done {
            info!("terminaron todas las tareas map");
        }
        Ok(())
    }

    /* ---------------- reduce ---------------- */

    pub fn get_reduce_task(&self) -> ReduceTaskResponse {
        let (response, dispatched) = {
            let mut st = self.lock();

            if !st.map_phase.is_done {
                // los inputs de las reduce todavía no son definitivos
                (ReduceTaskResponse::wait(), None)
            } else {
                match st.reduce_phase.take_next() {
                    Some(task) => {
                        info!(
                            "asignando reduce {} ({} inputs)",
                            task.ordinal,
                            task.input_files.len()
                        );
                        let assignment = ReduceAssignment {
                            reduce_ordinal: task.ordinal,
                            input_ids: task.input_files,
                        };
                        (ReduceTaskResponse::process(assignment), Some(task.ordinal))
                    }
                    None if st.reduce_phase.is_done => {
                        st.mark_job_done();
                        (ReduceTaskResponse::exit(), None)
                    }
                    None => (ReduceTaskResponse::wait(), None),
                }
            }
        };

        if let Some(ordinal) = dispatched {
            failover::schedule_reduce_requeue(self.clone(), ordinal);
        }
        response
    }

    /// Ver [`Coordinator::requeue_map_task`].
    pub fn requeue_reduce_task(&self, ordinal: ReduceOrdinal) -> bool {
        let mut st = self.lock();
        let requeued = st.reduce_phase.requeue(ordinal);
        if requeued {
            st.requeued += 1;
            warn!(
                "reduce {} no terminó en {:?}, reencolando",
                ordinal, self.grace_period
            );
        }
        requeued
    }

    pub fn finished_reduce_task(
        &self,
        req: &FinishedReduceRequest,
    ) -> Result<(), CoordinatorError> {
        let mut st = self.lock();

        if !st.reduce_phase.contains(req.reduce_ordinal) {
            return Err(CoordinatorError::UnknownReduceTask(req.reduce_ordinal));
        }

        if !st.reduce_phase.mark_completed(req.reduce_ordinal) {
            info!("reduce {} reportada de nuevo", req.reduce_ordinal);
        }
        info!("salida de reduce: {}", req.output_id);

        if st.reduce_phase.is_done {
            st.mark_job_done();
        }
        Ok(())
    }

    /* ---------------- consultas ---------------- */

    pub fn done(&self) -> bool {
        self.lock().job_done
    }

    pub fn status(&self) -> JobStatusReport {
        let st = self.lock();

        let phase = if st.job_done {
            JobPhase::Done
        } else if st.map_phase.is_done {
            JobPhase::Reduce
        } else {
            JobPhase::Map
        };

        JobStatusReport {
            phase,
            n_reduce: st.n_reduce,
            map_total: st.map_phase.total_tasks,
            map_completed: st.map_phase.completed.len(),
            map_backlog: st.map_phase.backlog.len(),
            reduce_total: st.reduce_phase.total_tasks(),
            reduce_completed: st.reduce_phase.completed.len(),
            reduce_backlog: st.reduce_phase.backlog.len(),
            requeued: st.requeued,
            started_at: st.started_at,
            finished_at: st.finished_at,
            done: st.job_done,
        }
    }
}
