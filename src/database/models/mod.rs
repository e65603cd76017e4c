pub mod card;
pub mod user;

pub use card::{Card, CardRow, CardStatus, InvalidCardStatus, NewCard};
pub use user::{NewUser, PublicUser, User};
