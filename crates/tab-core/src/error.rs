use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("could not resolve workspace path: {0}")]
    UnresolvedPath(String),
}

pub type Result<T> = std::result::Result<T, Error>;
