use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Wire(#[from] zenith_wire::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
