pub mod sqlite;

pub use sqlite::SqliteFrameExecutor;
