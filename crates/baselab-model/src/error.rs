use thiserror::Error;

use crate::ids::ConceptId;

#[derive(Debug, Error)]
pub enum BaselabError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog conflict for itemid {id}: {detail}")]
    CatalogConflict { id: ConceptId, detail: String },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, BaselabError>;
