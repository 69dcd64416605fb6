use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlbumsError {
    #[error("Change set index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Inconsistent change set: {0}")]
    Consistency(String),
}

pub type Result<T> = std::result::Result<T, AlbumsError>;
