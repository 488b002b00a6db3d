mod collection;
mod config;
mod database;
mod error;
mod index;
mod session;

pub use config::{CollectionConfig, DatabaseConfig};
pub use database::{Database, Selector, UpdateOptions, UpdateResult};
pub use error::{DbError, DbErrorCode};
pub use index::{FieldIndex, IndexKey, NumberKey};
pub use session::{LastError, Session};

pub use quill_update::{ErrorCode, FieldPath, UpdateConfig};
