//! Session persistence: SQLite on a dedicated worker thread, plus an
//! in-memory store with the same rules.

mod connection;
pub mod helpers;
mod migrations;
pub mod repositories;
mod sink;

pub use connection::Database;
pub use repositories::sessions::MAX_SESSIONS_PER_MODE;
pub use sink::{MemorySessionStore, SessionSink};
