pub mod deck_service;
pub mod events;
pub mod user_deck_service;

pub use deck_service::DeckService;
pub use events::{log_deck_event, DeckEvent, DeckHooks};
pub use user_deck_service::UserDeckService;
