use thiserror::Error;

use crate::storage::BlobKey;
use crate::time_entry::TimeCategory;

/// 永続化の失敗。
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read blob '{key}': {source}")]
    Read {
        key: BlobKey,
        source: std::io::Error,
    },

    #[error("Failed to write blob '{key}': {source}")]
    Write {
        key: BlobKey,
        source: std::io::Error,
    },

    #[error("Failed to encode blob '{key}': {source}")]
    Encode {
        key: BlobKey,
        source: serde_json::Error,
    },
}

/// 類別予算の作成時に検証される条件の違反。
#[derive(Error, Debug, PartialEq)]
pub enum BudgetError {
    #[error("Category '{0}' already has a budget")]
    AlreadyAllocated(TimeCategory),

    #[error("Allocated minutes must be positive, got {0}")]
    NotPositive(f64),

    #[error("Requested {requested} minutes but only {available} minutes are unallocated")]
    ExceedsUnallocated { requested: f64, available: f64 },
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown category: '{0}'")]
pub struct ParseCategoryError(pub String);
