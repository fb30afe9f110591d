//! Pares map / reduce incluidos, elegibles por nombre desde la CLI del worker.

use crate::{error::MrError, Workload};

pub mod indexer;
pub mod wc;

/// Devuelve el [`Workload`] llamado `name`, o `None` si no existe.
pub fn try_named(name: &str) -> Option<Workload> {
    match name {
        "wc" => Some(Workload {
            map_fn: wc::map,
            reduce_fn: wc::reduce,
        }),
        "indexer" => Some(Workload {
            map_fn: indexer::map,
            reduce_fn: indexer::reduce,
        }),
        _ => None,
    }
}

pub fn named(name: &str) -> Result<Workload, MrError> {
    try_named(name).ok_or_else(|| MrError::UnknownWorkload(name.to_string()))
}

/// Parte el texto en palabras en minúscula hechas de alfanuméricos y `_`.
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|raw| {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_lowercase();
        (!cleaned.is_empty()).then_some(cleaned)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_finds_builtin_workloads() {
        assert!(named("wc").is_ok());
        assert!(named("indexer").is_ok());
        assert!(matches!(named("nope"), Err(MrError::UnknownWorkload(_))));
    }

    #[test]
    fn tokenize_normalizes_words() {
        let words: Vec<String> = tokenize("Hola hola, mundo!!\nmundo   mundo_prueba --").collect();
        assert_eq!(words, vec!["hola", "hola", "mundo", "mundo", "mundo_prueba"]);
    }
}
