pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryCardStore, MemoryUserStore};
pub use postgres::{PgCardStore, PgUserStore};
pub use store::{CardStore, CredentialStore, StoreError};
