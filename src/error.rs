use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("No free port in range {start}..={end}")]
    NoFreePort { start: u16, end: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry encoding error: {0}")]
    RegistryEncoding(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid peer URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, MeshError>;
