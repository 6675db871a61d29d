mod bootstrap;
mod host_commands;
mod loop_runner;

use std::io;

use console_engine::{ConfigError, RegistryError};
use thiserror::Error;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;

#[derive(Debug, Error)]
pub(crate) enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to register console commands: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to spawn stdin reader: {0}")]
    SpawnReader(#[source] io::Error),
}
