use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("{op} timed out")]
    Timeout { op: &'static str },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

pub type Result<T> = std::result::Result<T, Error>;
