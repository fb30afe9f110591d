use serde::{Deserialize, Serialize};

/// Índice denso de una tarea map en `[0, total_map_tasks)`.
pub type MapOrdinal = usize;

/// Índice denso de una tarea reduce (y de su bucket) en `[0, n_reduce)`.
pub type ReduceOrdinal = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTask {
    /// Input sobre el que corre la función map (una ruta de archivo).
    pub input_id: String,
    /// Prefija todos los artefactos intermedios que produce esta tarea.
    pub ordinal: MapOrdinal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReduceTask {
    pub ordinal: ReduceOrdinal,
    /// Artefactos intermedios de este bucket, agregados a medida que terminan
    /// las tareas map. Puede tener el mismo identificador repetido.
    pub input_files: Vec<String>,
}

impl ReduceTask {
    pub fn new(ordinal: ReduceOrdinal) -> Self {
        Self {
            ordinal,
            input_files: Vec::new(),
        }
    }
}
