//! Asignación de claves a buckets de reduce.
//!
//! Todos los workers de un job tienen que coincidir en esta función, por eso
//! es un FNV-1a fijo y no el hasher de std con semilla aleatoria.
//!
//! Es el FNV-1a de 64 bits de `fnv::FnvHasher` enmascarado a 31 bits, no el
//! FNV-1a de 32 bits (`fnv.New32a`) de otras versiones de `ihash`: una misma
//! clave puede caer en otro bucket que con esas. Dentro de un job es consistente.

use std::hash::Hasher;

use fnv::FnvHasher;

/// Hashea una clave intermedia a un valor no negativo de 31 bits.
pub fn ihash(key: &str) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(key.as_bytes());
    (hasher.finish() & 0x7fff_ffff) as u32
}

/// Reduce bucket for `key`: `ihash(key) % n_reduce`.
pub fn bucket_for(key: &str, n_reduce: usize) -> usize {
    debug_assert!(n_reduce > 0);
    ihash(key) as usize % n_reduce
}
