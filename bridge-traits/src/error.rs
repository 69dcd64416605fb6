use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Library provider error: {0}")]
    Provider(String),

    #[error("Thumbnail load failed for item {item_id}: {message}")]
    Thumbnail { item_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, BridgeError>;
