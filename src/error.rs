#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Bad location: offset {offset} length {length} is outside the buffer")]
    BadLocation { offset: usize, length: usize },

    #[error("Bad line: {0}")]
    BadLine(usize),

    #[error("Invalid block token: {0:?} is not an identifier")]
    InvalidBlockToken(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn bad_location(offset: usize, length: usize) -> Self {
        Error::BadLocation { offset, length }
    }
}

impl From<confique::Error> for Error {
    fn from(value: confique::Error) -> Self {
        Error::Config(value.to_string())
    }
}
