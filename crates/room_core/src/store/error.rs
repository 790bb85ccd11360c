use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table not declared: {table}")]
    MissingTable { table: String },

    #[error("Store closed")]
    Closed,
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Json(_) => false,
            StoreError::MissingTable { .. } => false,
            StoreError::Closed => false,
        }
    }
}
