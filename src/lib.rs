//! 個人の時間予算を管理するためのライブラリ。
//!
//! 類別ごとに時間を記録し、月ごとの時間予算に対する使用状況を集計する。
//! 状態は[`store::Store`]が保持し、[`storage::BlobStore`]を通して永続化する。

pub mod budget;
pub mod budget_command;
pub mod config;
pub mod console;
pub mod context;
pub mod daily_command;
pub mod datetime;
pub mod error;
pub mod history_command;
pub mod monthly_command;
pub mod record_command;
pub mod storage;
pub mod store;
pub mod tag;
pub mod tag_command;
pub mod time_entry;
pub mod tracking;

pub use budget::{CategoryBudget, TimeBudget};
pub use error::{BudgetError, StorageError};
pub use storage::{BlobKey, BlobStore, FileBlobStore, MemoryBlobStore};
pub use store::{Store, StoreEvent, StoreState, SubscriptionId};
pub use tag::CustomTag;
pub use time_entry::{TimeCategory, TimeEntry};
pub use tracking::TrackingSession;
