use std::{fs, time::Duration};

use coordinator::{AppState, Coordinator};
use tempfile::TempDir;
use tokio::{net::TcpListener, sync::mpsc};
use worker::WorkerConfig;

fn worker_config(url: &str, id: &str, dir: &TempDir) -> WorkerConfig {
    WorkerConfig {
        worker_id: id.to_string(),
        coordinator_url: url.to_string(),
        workload: common::workload::named("wc").unwrap(),
        output_dir: dir.path().join("out"),
        wait: Duration::from_millis(20),
        request_timeout: Duration::from_secs(2),
        max_consecutive_failures: 5,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_workers_count_words_across_two_inputs() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    fs::write(&first, "a b a").unwrap();
    fs::write(&second, "b b").unwrap();

    let coordinator = Coordinator::new(
        [first.to_string_lossy().to_string(), second.to_string_lossy().to_string()],
        2,
        Duration::from_secs(10),
    );
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();
    let state = AppState {
        coordinator: coordinator.clone(),
        fatal_tx,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(coordinator::serve(listener, state, std::future::pending()));

    let one = tokio::spawn(worker::run(worker_config(&url, "w1", &dir)));
    let two = tokio::spawn(worker::run(worker_config(&url, "w2", &dir)));
    one.await.unwrap().unwrap();
    two.await.unwrap().unwrap();

    assert!(coordinator.done());
    assert!(fatal_rx.try_recv().is_err());

    let mut lines: Vec<String> = (0..2)
        .flat_map(|r| {
            let path = dir.path().join("out").join(format!("mr-out-{r}"));
            fs::read_to_string(path)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    lines.sort();
    assert_eq!(lines, vec!["a 2", "b 3"]);
}
