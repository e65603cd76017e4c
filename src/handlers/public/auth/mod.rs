// handlers/public/auth/mod.rs - Public authentication handlers
pub mod login; // POST /api/v1/auth/login - authenticate and get JWT
pub mod register; // POST /api/v1/auth/register - create new account

pub use login::login_post;
pub use register::register_post;
