use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Configuration file not found. Looked in:\n\
        - GPU_FINDER_CONFIG environment variable\n\
        - current directory: gpu-config.json\n\
        - ~/.config/gpufinder/gpu-config.json"
    )]
    ConfigFileNotFound,

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Please match the number of GPUs parameter with the correct machine type in the config file \
        ({machine_type} has {in_machine_type} GPUs, number_of_gpus is {requested})"
    )]
    GpuCountMismatch {
        machine_type: String,
        in_machine_type: u32,
        requested: u32,
    },

    #[error("Cannot read the GPU count from machine type '{0}'")]
    MalformedMachineType(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
