//! Conteo de palabras: `(word, "1")` por token, sumado por palabra.

use anyhow::{Context, Result};

use super::tokenize;
use crate::KeyValue;

pub fn map(_input_id: &str, contents: &str) -> Result<Vec<KeyValue>> {
    Ok(tokenize(contents)
        .map(|word| KeyValue::new(word, "1"))
        .collect())
}

pub fn reduce(key: &str, values: &[String]) -> Result<String> {
    let mut total: u64 = 0;
    for v in values {
        total += v
            .parse::<u64>()
            .with_context(|| format!("conteo inválido {v:?} para {key:?}"))?;
    }
    Ok(total.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emits_one_per_token() {
        let out = map("in.txt", "a b a").unwrap();
        assert_eq!(
            out,
            vec![
                KeyValue::new("a", "1"),
                KeyValue::new("b", "1"),
                KeyValue::new("a", "1"),
            ]
        );
    }

    #[test]
    fn reduce_sums_counts() {
        let values = vec!["1".to_string(), "1".to_string(), "3".to_string()];
        assert_eq!(reduce("a", &values).unwrap(), "5");
    }

    #[test]
    fn reduce_rejects_non_numeric_values() {
        assert!(reduce("a", &["x".to_string()]).is_err());
    }
}
