//! Motor de shuffle: lo que hace un worker entre recibir una tarea y
//! reportarla terminada.
//!
//! Lado map: correr la función map, repartir la salida en `n_reduce` buckets
//! según el hash de la clave, escribir cada bucket a un temporal y recién
//! después publicarlos todos. Lado reduce: leer el bucket de cada tarea map
//! (una vez por tarea, aunque se haya reportado dos veces), ordenar por clave,
//! llamar a reduce una vez por clave y publicar la salida.

use std::collections::HashSet;
use std::fs;
use std::io::Write;

use tracing::debug;

use crate::{
    artifact::{parse_intermediate_id, ArtifactStore},
    codec,
    error::MrError,
    partition::bucket_for,
    task::{MapOrdinal, ReduceOrdinal},
    KeyValue, ReduceFn, Workload,
};

/* =========================
   Lado map
   ========================= */

/// Reparte `records` en `n_reduce` buckets según `bucket_for(key)`, manteniendo
/// el orden de emisión dentro de cada bucket. Siempre devuelve `n_reduce` buckets.
pub fn partition_records(records: Vec<KeyValue>, n_reduce: usize) -> Vec<Vec<KeyValue>> {
    let mut buckets: Vec<Vec<KeyValue>> = (0..n_reduce).map(|_| Vec::new()).collect();
    for kv in records {
        let bucket = bucket_for(&kv.key, n_reduce);
        buckets[bucket].push(kv);
    }
    buckets
}

/// Escribe cada bucket a un temporal y, solo cuando están todos completos,
/// los publica. Devuelve los identificadores finales en orden de bucket.
pub fn write_intermediate(
    store: &ArtifactStore,
    map_ordinal: MapOrdinal,
    buckets: &[Vec<KeyValue>],
) -> Result<Vec<String>, MrError> {
    // 1) escribir cada bucket a su propio temporal
    let mut temps = Vec::with_capacity(buckets.len());
    for (bucket, records) in buckets.iter().enumerate() {
        let id = store.intermediate_id(map_ordinal, bucket);
        let mut tmp = store.create_temp(&id)?;
        for kv in records {
            codec::encode_record(tmp.writer(), kv, &id)?;
        }
        temps.push(tmp);
    }

    // 2) publicar todos
    temps.into_iter().map(|tmp| tmp.publish()).collect()
}

/// Corre una tarea map completa y devuelve los ids intermedios publicados.
pub fn run_map_task(
    store: &ArtifactStore,
    workload: &Workload,
    input_id: &str,
    map_ordinal: MapOrdinal,
    n_reduce: usize,
) -> Result<Vec<String>, MrError> {
    let bytes = fs::read(input_id).map_err(|e| MrError::io(input_id, e))?;
    let contents = String::from_utf8_lossy(&bytes);

    let records = (workload.map_fn)(input_id, &contents).map_err(|e| MrError::UserFunction {
        phase: "map",
        message: format!("{e:#}"),
    })?;
    debug!(
        "map {} emitió {} registros de {}",
        map_ordinal,
        records.len(),
        input_id
    );

    let buckets = partition_records(records, n_reduce);
    write_intermediate(store, map_ordinal, &buckets)
}

/* =========================
   Lado reduce
   ========================= */

/// Descarta identificadores repetidos del mismo par `(map_ordinal, bucket)`,
/// quedándose con la primera aparición y el orden original.
pub fn dedup_inputs(input_ids: &[String]) -> Result<Vec<String>, MrError> {
    let mut seen: HashSet<(MapOrdinal, ReduceOrdinal)> = HashSet::new();
    let mut out = Vec::new();
    for id in input_ids {
        if seen.insert(parse_intermediate_id(id)?) {
            out.push(id.clone());
        }
    }
    Ok(out)
}

/// Lee y concatena los registros de cada input (ya sin duplicados).
pub fn read_intermediate(
    store: &ArtifactStore,
    input_ids: &[String],
) -> Result<Vec<KeyValue>, MrError> {
    let mut out = Vec::new();
    for id in input_ids {
        let contents = store.read_to_string(id)?;
        out.extend(codec::decode_records(id, &contents)?);
    }
    Ok(out)
}

/// Ordena de forma estable por clave y junta los valores de cada tramo de
/// claves iguales. Los valores mantienen su orden; los grupos salen ordenados.
pub fn group_by_key(mut records: Vec<KeyValue>) -> Vec<(String, Vec<String>)> {
    records.sort_by(|a, b| a.key.cmp(&b.key));

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for kv in records {
        match groups.last_mut() {
            Some((key, values)) if *key == kv.key => values.push(kv.value),
            _ => groups.push((kv.key, vec![kv.value])),
        }
    }
    groups
}

/// Llama a `reduce_fn` una vez por grupo y publica líneas `key value` como
/// salida de la tarea reduce `reduce_ordinal`.
pub fn reduce_to_output(
    store: &ArtifactStore,
    reduce_ordinal: ReduceOrdinal,
    groups: Vec<(String, Vec<String>)>,
    reduce_fn: ReduceFn,
) -> Result<String, MrError> {
    let id = store.output_id(reduce_ordinal);
    let mut tmp = store.create_temp(&id)?;

    for (key, values) in groups {
        let output = reduce_fn(&key, &values).map_err(|e| MrError::UserFunction {
            phase: "reduce",
            message: format!("{e:#}"),
        })?;
        writeln!(tmp, "{} {}", key, output).map_err(|e| MrError::io(&id, e))?;
    }

    tmp.publish()
}

/// Corre una tarea reduce completa y devuelve el id de salida publicado.
pub fn run_reduce_task(
    store: &ArtifactStore,
    workload: &Workload,
    reduce_ordinal: ReduceOrdinal,
    input_ids: &[String],
) -> Result<String, MrError> {
    let inputs = dedup_inputs(input_ids)?;
    if inputs.len() != input_ids.len() {
        debug!(
            "reduce {} ignora {} inputs duplicados",
            reduce_ordinal,
            input_ids.len() - inputs.len()
        );
    }

    let records = read_intermediate(store, &inputs)?;
    let groups = group_by_key(records);
    reduce_to_output(store, reduce_ordinal, groups, workload.reduce_fn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    fn kv(k: &str, v: &str) -> KeyValue {
        KeyValue::new(k, v)
    }

    fn write_input(dir: &Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().to_string()
    }

    fn sorted_lines(path: &str) -> Vec<String> {
        let mut lines: Vec<String> = fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        lines.sort();
        lines
    }

    /* =========================
       PARTITION
       ========================= */

    #[test]
    fn partition_records_sends_equal_keys_to_the_same_bucket() {
        let records = vec![kv("a", "1"), kv("b", "1"), kv("a", "2"), kv("c", "1")];
        let buckets = partition_records(records, 3);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.iter().map(Vec::len).sum::<usize>(), 4);

        let a_bucket = &buckets[bucket_for("a", 3)];
        let a_values: Vec<&str> = a_bucket
            .iter()
            .filter(|kv| kv.key == "a")
            .map(|kv| kv.value.as_str())
            .collect();
        assert_eq!(a_values, vec!["1", "2"]);
    }

    #[test]
    fn write_intermediate_publishes_every_bucket_even_empty_ones() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        let buckets = partition_records(vec![kv("solo", "1")], 4);
        let ids = write_intermediate(&store, 5, &buckets).unwrap();

        assert_eq!(ids.len(), 4);
        for (bucket, id) in ids.iter().enumerate() {
            assert_eq!(*id, store.intermediate_id(5, bucket));
            assert!(Path::new(id).exists());
        }
        let non_empty = ids
            .iter()
            .filter(|id| !fs::read_to_string(id).unwrap().is_empty())
            .count();
        assert_eq!(non_empty, 1);
    }

    #[test]
    fn write_intermediate_publishes_nothing_when_a_record_is_unencodable() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        let buckets = vec![vec![kv("ok", "1")], vec![kv("bad key", "1")]];
        let err = write_intermediate(&store, 0, &buckets).unwrap_err();

        assert!(matches!(err, MrError::UnencodableRecord { .. }));
        assert!(!Path::new(&store.intermediate_id(0, 0)).exists());
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }

    /* =========================
       DEDUP / GROUP / REDUCE
       ========================= */

    #[test]
    fn dedup_inputs_keeps_one_id_per_map_and_bucket() {
        let ids: Vec<String> = ["out/mr-0-1", "out/mr-1-1", "out/mr-0-1", "out/mr-2-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let deduped = dedup_inputs(&ids).unwrap();
        assert_eq!(deduped, vec!["out/mr-0-1", "out/mr-1-1", "out/mr-2-1"]);
    }

    #[test]
    fn dedup_inputs_rejects_foreign_identifiers() {
        let ids = vec!["out/whatever".to_string()];
        assert!(matches!(
            dedup_inputs(&ids),
            Err(MrError::BadArtifactId(_))
        ));
    }

    #[test]
    fn group_by_key_yields_one_group_per_key_in_order() {
        let groups = group_by_key(vec![kv("a", "1"), kv("b", "1"), kv("a", "1")]);
        assert_eq!(
            groups,
            vec![
                ("a".to_string(), vec!["1".to_string(), "1".to_string()]),
                ("b".to_string(), vec!["1".to_string()]),
            ]
        );
    }

    #[test]
    fn group_by_key_keeps_value_order_within_a_key() {
        let groups = group_by_key(vec![kv("k", "3"), kv("j", "x"), kv("k", "1"), kv("k", "2")]);
        assert_eq!(groups[1].1, vec!["3", "1", "2"]);
    }

    thread_local! {
        static CALLS: RefCell<Vec<(String, Vec<String>)>> = const { RefCell::new(Vec::new()) };
    }

    fn recording_reduce(key: &str, values: &[String]) -> anyhow::Result<String> {
        CALLS.with(|c| c.borrow_mut().push((key.to_string(), values.to_vec())));
        Ok(values.len().to_string())
    }

    #[test]
    fn reduce_calls_user_function_once_per_distinct_key() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        let groups = group_by_key(vec![kv("a", "1"), kv("b", "1"), kv("a", "1")]);
        let id = reduce_to_output(&store, 0, groups, recording_reduce).unwrap();

        let calls = CALLS.with(|c| c.borrow().clone());
        assert_eq!(
            calls,
            vec![
                ("a".to_string(), vec!["1".to_string(), "1".to_string()]),
                ("b".to_string(), vec!["1".to_string()]),
            ]
        );
        assert_eq!(fs::read_to_string(id).unwrap(), "a 2\nb 1\n");
    }

    #[test]
    fn run_reduce_task_with_no_inputs_publishes_empty_output() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let wc = workload::named("wc").unwrap();

        let id = run_reduce_task(&store, &wc, 3, &[]).unwrap();
        assert!(id.ends_with("mr-out-3"));
        assert!(fs::read_to_string(id).unwrap().is_empty());
    }

    #[test]
    fn run_map_task_fails_on_missing_input() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path().join("out")).unwrap();
        let wc = workload::named("wc").unwrap();

        let missing = dir.path().join("no_existe.txt");
        let err = run_map_task(&store, &wc, missing.to_str().unwrap(), 0, 2).unwrap_err();
        assert!(matches!(err, MrError::Io { .. }));
    }

    #[test]
    fn run_map_task_accepts_input_that_is_not_utf8() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path().join("out")).unwrap();
        let wc = workload::named("wc").unwrap();

        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9 a a").unwrap();
        let input = path.to_string_lossy().to_string();

        let ids = run_map_task(&store, &wc, &input, 0, 1).unwrap();
        let out = run_reduce_task(&store, &wc, 0, &ids).unwrap();

        assert_eq!(sorted_lines(&out), vec!["a 2", "caf 1"]);
    }

    /* =========================
       PIPELINE
       ========================= */

    #[test]
    fn word_count_over_two_inputs_and_two_buckets() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path().join("out")).unwrap();
        let wc = workload::named("wc").unwrap();

        let in0 = write_input(dir.path(), "in0.txt", "a b a");
        let in1 = write_input(dir.path(), "in1.txt", "b b");

        let mut per_bucket: Vec<Vec<String>> = vec![Vec::new(), Vec::new()];
        for (ordinal, input) in [in0, in1].iter().enumerate() {
            let ids = run_map_task(&store, &wc, input, ordinal, 2).unwrap();
            for id in ids {
                let bucket = crate::artifact::parse_bucket_suffix(&id).unwrap();
                per_bucket[bucket].push(id);
            }
        }

        let mut all = Vec::new();
        for (bucket, inputs) in per_bucket.iter().enumerate() {
            let out = run_reduce_task(&store, &wc, bucket, inputs).unwrap();
            all.extend(sorted_lines(&out));
        }
        all.sort();

        assert_eq!(all, vec!["a 2", "b 3"]);
    }

    #[test]
    fn duplicate_map_execution_is_not_double_counted() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path().join("out")).unwrap();
        let wc = workload::named("wc").unwrap();
        let input = write_input(dir.path(), "in.txt", "x x y");

        // la misma tarea map corre dos veces y ambos intentos reportan
        let first = run_map_task(&store, &wc, &input, 0, 1).unwrap();
        let second = run_map_task(&store, &wc, &input, 0, 1).unwrap();
        assert_eq!(first, second);

        let inputs: Vec<String> = first.into_iter().chain(second).collect();
        let out = run_reduce_task(&store, &wc, 0, &inputs).unwrap();

        assert_eq!(sorted_lines(&out), vec!["x 2", "y 1"]);
    }
}
