//! Índice invertido: para cada palabra, los inputs donde aparece.
//!
//! El valor de salida es `<n>,<input>,<input>...` con inputs ordenados y sin
//! repetir. El identificador del input viaja como valor intermedio, así que
//! no puede tener espacios.

use std::collections::BTreeSet;

use anyhow::Result;

use super::tokenize;
use crate::KeyValue;

pub fn map(input_id: &str, contents: &str) -> Result<Vec<KeyValue>> {
    let words: BTreeSet<String> = tokenize(contents).collect();
    Ok(words
        .into_iter()
        .map(|word| KeyValue::new(word, input_id))
        .collect())
}

pub fn reduce(_key: &str, values: &[String]) -> Result<String> {
    let inputs: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    let mut out = inputs.len().to_string();
    for input in inputs {
        out.push(',');
        out.push_str(input);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emits_each_word_once_per_input() {
        let out = map("doc1", "b a b").unwrap();
        assert_eq!(
            out,
            vec![KeyValue::new("a", "doc1"), KeyValue::new("b", "doc1")]
        );
    }

    #[test]
    fn reduce_lists_unique_sorted_inputs() {
        let values: Vec<String> = ["doc2", "doc1", "doc2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(reduce("a", &values).unwrap(), "2,doc1,doc2");
    }
}
