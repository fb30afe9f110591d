//! Worker de MapReduce: le pide tareas map al coordinador, después tareas
//! reduce, y corre cada una con el motor compartido.

pub mod client;
pub mod worker;

pub use client::CoordinatorClient;
pub use worker::{run, LoopEnd, WorkerConfig};
