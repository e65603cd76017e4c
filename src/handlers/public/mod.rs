// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition endpoints. Everything arriving here is untrusted input.
pub mod auth;
