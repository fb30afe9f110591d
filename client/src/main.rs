use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use common::{routes, DoneResponse, JobStatusReport};
use reqwest::Client;

#[derive(Parser)]
#[command(name = "mr-client")]
#[command(about = "CLI simple para consultar un coordinador de MapReduce")]
struct Cli {
    /// URL base del coordinador.
    #[arg(long, env = "MASTER_URL", default_value = "http://localhost:8080")]
    coordinator_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Progreso de las dos fases
    Status,
    /// Imprime `true` cuando reportaron todas las tareas reduce
    Done,
    /// Chequeo de vida
    Health,
    /// Consulta hasta que el job termine
    Wait {
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        /// Se rinde después de estos segundos (0 espera para siempre).
        #[arg(long, default_value_t = 0)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli.coordinator_url.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Status => {
            let report: JobStatusReport = get_json(&client, &base_url, routes::STATUS).await?;
            print!("{}", render_status(&report));
        }
        Commands::Done => {
            let done: DoneResponse = get_json(&client, &base_url, routes::DONE).await?;
            println!("{}", done.done);
        }
        Commands::Health => {
            let url = format!("{}{}", base_url, routes::HEALTH);
            let resp = client.get(&url).send().await.context("coordinador inalcanzable")?;
            if !resp.status().is_success() {
                bail!("el coordinador respondió {}", resp.status());
            }
            println!("{}", resp.text().await?);
        }
        Commands::Wait {
            interval_ms,
            timeout_secs,
        } => {
            let started = tokio::time::Instant::now();
            loop {
                let done: DoneResponse = get_json(&client, &base_url, routes::DONE).await?;
                if done.done {
                    println!("job terminado");
                    break;
                }
                if timeout_secs > 0 && started.elapsed() >= Duration::from_secs(timeout_secs) {
                    bail!("el job no terminó después de {}s", timeout_secs);
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
    }

    Ok(())
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    base_url: &str,
    route: &str,
) -> Result<T> {
    let url = format!("{}{}", base_url, route);
    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("no se pudo contactar {}", url))?;
    if !resp.status().is_success() {
        bail!("{} respondió {}", url, resp.status());
    }
    Ok(resp.json().await?)
}

fn render_status(report: &JobStatusReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("fase:        {:?}\n", report.phase));
    out.push_str(&format!(
        "map:         {}/{} terminadas, {} en cola\n",
        report.map_completed, report.map_total, report.map_backlog
    ));
    out.push_str(&format!(
        "reduce:      {}/{} terminadas, {} en cola\n",
        report.reduce_completed, report.reduce_total, report.reduce_backlog
    ));
    out.push_str(&format!("reencoladas: {}\n", report.requeued));
    out.push_str(&format!("inicio:      {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = report.finished_at {
        out.push_str(&format!("fin:         {}\n", finished.to_rfc3339()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::JobPhase;

    #[test]
    fn status_lists_both_phases() {
        let report = JobStatusReport {
            phase: JobPhase::Reduce,
            n_reduce: 2,
            map_total: 3,
            map_completed: 3,
            map_backlog: 0,
            reduce_total: 2,
            reduce_completed: 1,
            reduce_backlog: 1,
            requeued: 4,
            started_at: chrono::Utc::now(),
            finished_at: None,
            done: false,
        };

        let text = render_status(&report);
        assert!(text.contains("fase:        Reduce"));
        assert!(text.contains("map:         3/3 terminadas, 0 en cola"));
        assert!(text.contains("reduce:      1/2 terminadas, 1 en cola"));
        assert!(text.contains("reencoladas: 4"));
        assert!(!text.contains("fin:"));
    }

    #[test]
    fn cli_reads_subcommands() {
        let cli = Cli::try_parse_from(["mr-client", "--coordinator-url", "http://c:9", "wait"]).unwrap();
        assert_eq!(cli.coordinator_url, "http://c:9");
        assert!(matches!(cli.command, Commands::Wait { interval_ms: 1000, timeout_secs: 0 }));
    }
}
