// handlers/protected/mod.rs - Protected handlers (bearer JWT required)
//
// Every route here runs behind `jwt_auth_middleware`, which places the
// caller's `AuthIdentity` in request extensions.
pub mod auth; // /api/v1/auth/me, /api/v1/auth/password
pub mod cards; // /api/v1/cards/*
