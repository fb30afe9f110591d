//! Cola pendiente y tareas completadas de las dos fases de un job.
//!
//! Son contenedores de estado sin lógica de red: el coordinador guarda uno de
//! cada uno detrás de su lock y es el único que los modifica.

use std::collections::{HashSet, VecDeque};

use crate::task::{MapOrdinal, MapTask, ReduceOrdinal, ReduceTask};

/* =========================
   Fase map
   ========================= */

#[derive(Debug, Clone)]
pub struct MapPhase {
    /// Tareas que no están asignadas a nadie.
    pub backlog: VecDeque<MapTask>,
    pub completed: HashSet<MapOrdinal>,
    pub total_tasks: usize,
    /// `true` sii `completed.len() == total_tasks`.
    pub is_done: bool,
}

impl MapPhase {
    /// Una tarea por input, ordinales `0..inputs.len()` en el orden del input.
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backlog: VecDeque<MapTask> = inputs
            .into_iter()
            .enumerate()
            .map(|(ordinal, input_id)| MapTask {
                input_id: input_id.into(),
                ordinal,
            })
            .collect();
        let total_tasks = backlog.len();

        Self {
            backlog,
            completed: HashSet::new(),
            total_tasks,
            // sin inputs no hay nada que esperar
            is_done: total_tasks == 0,
        }
    }

    /// Saca la siguiente tarea sin asignar, si hay.
    pub fn take_next(&mut self) -> Option<MapTask> {
        self.backlog.pop_back()
    }

    /// Devuelve a la cola una tarea vencida, salvo que ya se haya completado
    /// (o que ya esté esperando en la cola). Indica si se reencoló.
    pub fn requeue(&mut self, task: MapTask) -> bool {
        if self.completed.contains(&task.ordinal)
            || self.backlog.iter().any(|t| t.ordinal == task.ordinal)
        {
            return false;
        }
        self.backlog.push_front(task);
        true
    }

    /// Registra una tarea terminada. Idempotente; devuelve `true` solo la
    /// primera vez que se ve el ordinal.
    pub fn mark_completed(&mut self, ordinal: MapOrdinal) -> bool {
        let newly = self.completed.insert(ordinal);
        if self.completed.len() == self.total_tasks {
            self.is_done = true;
        }
        newly
    }

    pub fn contains(&self, ordinal: MapOrdinal) -> bool {
        ordinal < self.total_tasks
    }
}

/* =========================
   Fase reduce
   ========================= */

#[derive(Debug, Clone)]
pub struct ReducePhase {
    /// Todas las tareas reduce, indexadas por ordinal. Acá vive la lista
    /// `input_files` que vale, esté asignada la tarea o no.
    pub tasks: Vec<ReduceTask>,
    /// Ordinales de las tareas que no están asignadas a nadie.
    pub backlog: VecDeque<ReduceOrdinal>,
    pub completed: HashSet<ReduceOrdinal>,
    /// `true` sii `completed.len() == n_reduce`.
    pub is_done: bool,
}

impl ReducePhase {
    pub fn new(n_reduce: usize) -> Self {
        Self {
            tasks: (0..n_reduce).map(ReduceTask::new).collect(),
            backlog: (0..n_reduce).collect(),
            completed: HashSet::new(),
            is_done: n_reduce == 0,
        }
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn contains(&self, ordinal: ReduceOrdinal) -> bool {
        ordinal < self.tasks.len()
    }

    /// Agrega un artefacto intermedio a los inputs del bucket `ordinal`.
    /// El que llama ya validó que el ordinal está en rango.
    pub fn add_input(&mut self, ordinal: ReduceOrdinal, intermediate_id: String) {
        self.tasks[ordinal].input_files.push(intermediate_id);
    }

    /// Saca la siguiente tarea sin asignar y devuelve una copia.
    pub fn take_next(&mut self) -> Option<ReduceTask> {
        let ordinal = self.backlog.pop_back()?;
        Some(self.tasks[ordinal].clone())
    }

    /// See [`MapPhase::requeue`].
    pub fn requeue(&mut self, ordinal: ReduceOrdinal) -> bool {
        if self.completed.contains(&ordinal) || self.backlog.contains(&ordinal) {
            return false;
        }
        self.backlog.push_front(ordinal);
        true
    }

    /// See [`MapPhase::mark_completed`].
    pub fn mark_completed(&mut self, ordinal: ReduceOrdinal) -> bool {
        let newly = self.completed.insert(ordinal);
        if self.completed.len() == self.tasks.len() {
            self.is_done = true;
        }
        newly
    }
}
