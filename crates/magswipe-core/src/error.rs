use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Reader type '{0}' invalid")]
    InvalidReaderKind(String),
}

pub type Result<T> = std::result::Result<T, Error>;
