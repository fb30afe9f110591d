use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MrError {
    #[error("error de I/O en `{id}`: {source}")]
    Io {
        id: String,
        #[source]
        source: io::Error,
    },

    #[error("registro mal formado en `{id}`, línea {line}: {text:?}")]
    MalformedRecord {
        id: String,
        line: usize,
        text: String,
    },

    /// El formato intermedio es `key value\n`; un espacio dentro de un campo
    /// no se puede distinguir del separador.
    #[error("registro no representable como línea intermedia: key={key:?} value={value:?}")]
    UnencodableRecord { key: String, value: String },

    #[error("identificador de artefacto inválido `{0}`")]
    BadArtifactId(String),

    #[error("workload desconocido `{0}`")]
    UnknownWorkload(String),

    #[error("falló la función {phase}: {message}")]
    UserFunction { phase: &'static str, message: String },
}

impl MrError {
    pub fn io(id: impl Into<String>, source: io::Error) -> Self {
        MrError::Io {
            id: id.into(),
            source,
        }
    }
}
