//! PostgreSQL connection management and the transactional store adapter.

pub mod pool;
pub mod transaction;

pub use pool::{create_pool, run_migrations, Database, DatabaseError};
pub use transaction::PgStoreTransaction;
