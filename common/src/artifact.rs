//! Artefactos en disco: buckets intermedios y salidas de reduce.
//!
//! Todo lo que produce un worker se escribe primero en un temporal con nombre
//! único dentro del directorio del store y después se renombra a su nombre
//! final. Dos intentos de la misma tarea nunca comparten archivo, y el nombre
//! final siempre tiene la salida completa de un solo intento.

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{
    error::MrError,
    task::{MapOrdinal, ReduceOrdinal},
};

const TEMP_PREFIX: &str = ".tmp-mr-";

/// Directorio con los artefactos intermedios y de salida de un job.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Abre (y crea si hace falta) el store en `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, MrError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| MrError::io(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identificador final del bucket `bucket` escrito por la tarea map `map_ordinal`.
    pub fn intermediate_id(&self, map_ordinal: MapOrdinal, bucket: ReduceOrdinal) -> String {
        self.root
            .join(format!("mr-{}-{}", map_ordinal, bucket))
            .to_string_lossy()
            .to_string()
    }

    /// Identificador final de la salida de la tarea reduce `reduce_ordinal`.
    pub fn output_id(&self, reduce_ordinal: ReduceOrdinal) -> String {
        self.root
            .join(format!("mr-out-{}", reduce_ordinal))
            .to_string_lossy()
            .to_string()
    }

    pub fn read_to_string(&self, id: &str) -> Result<String, MrError> {
        fs::read_to_string(id).map_err(|e| MrError::io(id, e))
    }

    /// Crea un temporal nuevo para `final_id`. Si se descarta sin publicar,
    /// el archivo se borra.
    pub fn create_temp(&self, final_id: &str) -> Result<TempArtifact, MrError> {
        let file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| MrError::io(final_id, e))?;
        Ok(TempArtifact {
            final_id: final_id.to_string(),
            writer: BufWriter::new(file),
        })
    }
}

/// Artefacto temporal en escritura, atado al nombre con el que se va a
/// publicar.
pub struct TempArtifact {
    final_id: String,
    writer: BufWriter<NamedTempFile>,
}

impl TempArtifact {
    pub fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Hace flush, sync y renombra atómicamente el temporal a su nombre final,
    /// pisando lo que haya dejado otro intento.
    pub fn publish(self) -> Result<String, MrError> {
        let TempArtifact { final_id, writer } = self;

        let file = writer
            .into_inner()
            .map_err(|e| MrError::io(&final_id, e.into_error()))?;
        file.as_file()
            .sync_all()
            .map_err(|e| MrError::io(&final_id, e))?;
        file.persist(&final_id)
            .map_err(|e| MrError::io(&final_id, e.error))?;

        Ok(final_id)
    }
}

impl Write for TempArtifact {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Número de bucket codificado en el `-<n>` final de un identificador intermedio.
pub fn parse_bucket_suffix(id: &str) -> Result<ReduceOrdinal, MrError> {
    id.rsplit('-')
        .next()
        .and_then(|s| s.parse::<ReduceOrdinal>().ok())
        .ok_or_else(|| MrError::BadArtifactId(id.to_string()))
}

/// `(map_ordinal, bucket)` codificados en un identificador intermedio
/// `.../mr-<map>-<bucket>`.
pub fn parse_intermediate_id(id: &str) -> Result<(MapOrdinal, ReduceOrdinal), MrError> {
    let bad = || MrError::BadArtifactId(id.to_string());

    let name = Path::new(id)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(bad)?;

    let mut fields = name.rsplitn(3, '-');
    let bucket = fields.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    let map = fields.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    match fields.next() {
        Some("mr") => Ok((map, bucket)),
        _ => Err(bad()),
    }
}
