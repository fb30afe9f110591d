//! Formato de los registros intermedios: un par `key value` por línea,
//! separados por un único espacio ASCII.
//!
//! No hay escapes, así que claves o valores con espacios se rechazan al
//! escribir en vez de producir un archivo que después se lee mal.

use std::io::Write;

use crate::{error::MrError, KeyValue};

fn is_encodable(field: &str) -> bool {
    !field.chars().any(char::is_whitespace)
}

/// Escribe `kv` en una línea. `id` nombra el destino para los errores.
pub fn encode_record<W: Write>(writer: &mut W, kv: &KeyValue, id: &str) -> Result<(), MrError> {
    if kv.key.is_empty() || !is_encodable(&kv.key) || !is_encodable(&kv.value) {
        return Err(MrError::UnencodableRecord {
            key: kv.key.clone(),
            value: kv.value.clone(),
        });
    }
    writeln!(writer, "{} {}", kv.key, kv.value).map_err(|e| MrError::io(id, e))
}

/// Parsea una línea (sin el salto de línea).
pub fn decode_line(line: &str) -> Option<KeyValue> {
    let (key, value) = line.split_once(' ')?;
    if key.is_empty() || value.contains(' ') {
        return None;
    }
    Some(KeyValue::new(key, value))
}

/// Parsea el contenido completo de un artefacto intermedio. Las líneas vacías
/// se saltean; cualquier otra cosa que no parsee es error.
pub fn decode_records(id: &str, contents: &str) -> Result<Vec<KeyValue>, MrError> {
    let mut out = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let kv = decode_line(line).ok_or_else(|| MrError::MalformedRecord {
            id: id.to_string(),
            line: idx + 1,
            text: line.to_string(),
        })?;
        out.push(kv);
    }
    Ok(out)
}
