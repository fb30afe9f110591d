use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobPhase {
    Map,
    Reduce,
    Done,
}

/// Foto del estado del coordinador, servida en la ruta de status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub phase: JobPhase,
    pub n_reduce: usize,

    pub map_total: usize,
    pub map_completed: usize,
    pub map_backlog: usize,

    pub reduce_total: usize,
    pub reduce_completed: usize,
    pub reduce_backlog: usize,

    /// Tareas reencoladas porque se les venció el plazo.
    pub requeued: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub done: bool,
}
