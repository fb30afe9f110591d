//! Mensajes entre los workers y el coordinador.
//!
//! El canal de control es HTTP + JSON; [`routes`] tiene las rutas que usan
//! ambos lados.

use serde::{Deserialize, Serialize};

use crate::task::{MapOrdinal, ReduceOrdinal};

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const MAP_NEXT: &str = "/api/v1/map/next";
    pub const MAP_FINISHED: &str = "/api/v1/map/finished";
    pub const REDUCE_NEXT: &str = "/api/v1/reduce/next";
    pub const REDUCE_FINISHED: &str = "/api/v1/reduce/finished";
    pub const DONE: &str = "/api/v1/done";
    pub const STATUS: &str = "/api/v1/status";
}

/// Qué debe hacer el worker después de pedir una tarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Directive {
    /// Viene una tarea; correrla y reportar.
    Process,
    /// No hay nada para repartir ahora, pero la fase no terminó.
    Wait,
    /// La fase terminó; dejar de pedir.
    Exit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyRequest {}

/* --------- Map --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapAssignment {
    pub input_id: String,
    pub map_ordinal: MapOrdinal,
    pub n_reduce: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTaskResponse {
    pub directive: Directive,
    pub task: Option<MapAssignment>,
}

impl MapTaskResponse {
    pub fn process(task: MapAssignment) -> Self {
        Self {
            directive: Directive::Process,
            task: Some(task),
        }
    }

    pub fn wait() -> Self {
        Self {
            directive: Directive::Wait,
            task: None,
        }
    }

    pub fn exit() -> Self {
        Self {
            directive: Directive::Exit,
            task: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedMapRequest {
    pub map_ordinal: MapOrdinal,
    /// Un identificador por bucket, siempre `n_reduce`.
    pub intermediate_ids: Vec<String>,
}

/* --------- Reduce --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceAssignment {
    pub reduce_ordinal: ReduceOrdinal,
    pub input_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceTaskResponse {
    pub directive: Directive,
    pub task: Option<ReduceAssignment>,
}

impl ReduceTaskResponse {
    pub fn process(task: ReduceAssignment) -> Self {
        Self {
            directive: Directive::Process,
            task: Some(task),
        }
    }

    pub fn wait() -> Self {
        Self {
            directive: Directive::Wait,
            task: None,
        }
    }

    pub fn exit() -> Self {
        Self {
            directive: Directive::Exit,
            task: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedReduceRequest {
    pub reduce_ordinal: ReduceOrdinal,
    /// Solo informativo.
    pub output_id: String,
}

/* --------- Misc --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoneResponse {
    pub done: bool,
}
