mod bootstrap;
mod gameplay;
mod loop_runner;
mod scenario;

pub(crate) use bootstrap::{build_app, init_tracing};
pub(crate) use loop_runner::run;
