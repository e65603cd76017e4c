pub mod auth_service;
pub mod cards_service;

pub use auth_service::{AuthError, AuthService, LoginResponse};
pub use cards_service::{CardInput, CardPatch, CardsError, CardsService, GeneratedCard};
