// handlers/mod.rs - Two-tier handler architecture
//
// Public (no auth) → Protected (bearer JWT, caller identity in extensions)
pub mod extract;
pub mod public; // /api/v1/auth/register, /api/v1/auth/login
pub mod protected; // /api/v1/auth/*, /api/v1/cards/*
