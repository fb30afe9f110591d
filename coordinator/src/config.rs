use std::{collections::HashSet, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use glob::glob;

#[derive(Parser, Debug, Clone)]
#[command(name = "mr-coordinator")]
#[command(about = "Reparte tareas map y reduce entre workers y reencola las que se traban")]
pub struct Args {
    /// Archivos de entrada o patrones glob, una tarea map por archivo.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Cantidad de tareas reduce (y de buckets).
    #[arg(long, env = "MR_N_REDUCE", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub n_reduce: u32,

    /// Dirección donde escucha el canal de control.
    #[arg(long, env = "MR_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Segundos que puede pasar una tarea asignada sin reportar antes de repartirla de nuevo.
    #[arg(long, env = "MR_GRACE_PERIOD_SECS", default_value_t = 10)]
    pub grace_period_secs: u64,

    /// Cada cuánto el launcher revisa si el job terminó.
    #[arg(long, env = "MR_DONE_POLL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,
}

impl Args {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

/// Expande cada patrón con `glob` y se queda solo con archivos, en el orden
/// dado y sin repetidos.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for pattern in patterns {
        let entries = glob(pattern).with_context(|| format!("patrón de entrada inválido `{pattern}`"))?;
        for entry in entries.flatten() {
            if !entry.is_file() {
                continue;
            }
            let path = entry.to_string_lossy().to_string();
            if seen.insert(path.clone()) {
                out.push(path);
            }
        }
    }

    if out.is_empty() {
        bail!("ningún archivo de entrada coincide con {:?}", patterns);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn expand_inputs_keeps_order_and_drops_repeats() {
        let dir = TempDir::new().unwrap();
        for name in ["pg-b.txt", "pg-a.txt", "notes.md"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("pg-dir.txt")).unwrap();

        let base = dir.path().to_string_lossy().to_string();
        let patterns = vec![
            format!("{base}/notes.md"),
            format!("{base}/pg-*.txt"),
            format!("{base}/notes.md"),
        ];

        let inputs = expand_inputs(&patterns).unwrap();
        let names: Vec<String> = inputs
            .iter()
            .map(|p| p.rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["notes.md", "pg-a.txt", "pg-b.txt"]);
    }

    #[test]
    fn expand_inputs_fails_when_nothing_matches() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.txt", dir.path().display());
        assert!(expand_inputs(&[pattern]).is_err());
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::try_parse_from(["mr-coordinator", "in/*.txt"]).unwrap();
        assert_eq!(args.inputs, vec!["in/*.txt"]);
        assert_eq!(args.n_reduce, 10);
        assert_eq!(args.grace_period(), Duration::from_secs(10));
    }

    #[test]
    fn args_reject_zero_reduce_tasks() {
        assert!(Args::try_parse_from(["mr-coordinator", "--n-reduce", "0", "a.txt"]).is_err());
    }
}
