use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown callback route: {0}")]
    UnknownRoute(String),
}
