use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Registry error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Docker error: {0}")]
    Docker(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),
}

pub type Result<T> = std::result::Result<T, UpdockError>;
