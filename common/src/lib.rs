//! Piezas compartidas entre el coordinador y los workers de MapReduce:
//! modelo de tareas y fases, mensajes del canal de control, hash de
//! particiones, formato intermedio y el motor de shuffle que corren los workers.

use serde::{Deserialize, Serialize};

pub mod artifact;
pub mod codec;
pub mod engine;
pub mod error;
pub mod partition;
pub mod phase;
pub mod rpc;
pub mod status;
pub mod task;
pub mod workload;

pub use artifact::ArtifactStore;
pub use error::MrError;
pub use partition::{bucket_for, ihash};
pub use phase::{MapPhase, ReducePhase};
pub use rpc::*;
pub use status::{JobPhase, JobStatusReport};
pub use task::{MapOrdinal, MapTask, ReduceOrdinal, ReduceTask};

/* --------- Tipos de la aplicación --------- */

/// Un registro emitido por una función map y consumido por una reduce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Una función map recibe el identificador del input y su contenido completo
/// y devuelve todos los pares `(key, value)` que emite.
pub type MapFn = fn(input_id: &str, contents: &str) -> anyhow::Result<Vec<KeyValue>>;

/// Una función reduce recibe una clave con todos sus valores (en orden de
/// shuffle) y devuelve el único valor de salida para esa clave.
pub type ReduceFn = fn(key: &str, values: &[String]) -> anyhow::Result<String>;

/// Par map / reduce. Ambas funciones deben ser deterministas: una tarea
/// puede correr más de una vez.
#[derive(Copy, Clone)]
pub struct Workload {
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}
