// handlers/protected/cards/mod.rs - Card handlers
//
// collection.rs: /cards/list, /cards/create, /cards/create_multiple_cards,
//                /cards/generate_multiple_cards
// card.rs:       /cards/by_id/:card_id, /cards/update/:card_id, /cards/delete/:card_id
pub mod card;
pub mod collection;

pub use card::{card_delete, card_get, card_patch};
pub use collection::{cards_create, cards_create_multiple, cards_generate, cards_list};
