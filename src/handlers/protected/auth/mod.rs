// handlers/protected/auth/mod.rs - Account handlers for authenticated users
pub mod me;
pub mod password;

pub use me::me_get;
pub use password::password_put;
