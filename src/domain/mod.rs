pub mod connection;
pub mod model;
pub mod query;
pub mod retry;

pub use connection::{ConnectionHandle, ConnectionMode, ConnectionState, ConnectionStatus};
pub use query::{Filter, Query};
pub use retry::{RetryOutcome, RetryPolicy};
