//! Host and accelerator awareness: probe, startup flags, execution
//! configuration selection, and resource usage sampling.

pub mod accelerator;
pub mod bootstrap;
pub mod monitor;
pub mod optimizer;
