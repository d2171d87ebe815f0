#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid account at index {index}: {reason}")]
    InvalidAccount { index: usize, reason: String },
}
