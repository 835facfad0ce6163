use crate::{Card, CoreError, Deck, DeckId, UserDeck, UserId};
use async_trait::async_trait;

pub mod memory;

/// Commit boundary shared by every repository contract.
///
/// Writes are applied to the store's working state immediately; `save` makes
/// them durable. Backends without a separate durability step return `Ok(true)`.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn save(&self) -> Result<bool, CoreError>;
}

/// Persistence contract for decks.
///
/// Write methods return `Ok(false)` when the store did not apply the change
/// (e.g. the row vanished), and `Err` for storage faults.
#[async_trait]
pub trait DeckRepository: UnitOfWork {
    /// All decks, each with its cards attached, ordered by id.
    async fn get_decks(&self) -> Result<Vec<Deck>, CoreError>;
    /// Cards of one deck, ordered by id. Unknown decks yield an empty list.
    async fn get_deck_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError>;
    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, CoreError>;
    async fn deck_exists_by_id(&self, id: DeckId) -> Result<bool, CoreError>;
    /// Case-insensitive match on the stored name.
    async fn deck_exists_by_name(&self, name: &str) -> Result<bool, CoreError>;
    /// Stores a new deck and writes the assigned id back into `deck`.
    async fn add_deck(&self, deck: &mut Deck) -> Result<bool, CoreError>;
    /// Removes the deck together with its cards and ownership links.
    async fn delete_deck(&self, deck: &Deck) -> Result<bool, CoreError>;
    async fn update_deck(&self, deck: &Deck) -> Result<bool, CoreError>;
}

#[async_trait]
pub trait CardRepository: UnitOfWork {
    /// Stores a card in an existing deck and writes the assigned id back into `card`.
    async fn add_card(&self, card: &mut Card) -> Result<bool, CoreError>;
}

#[async_trait]
pub trait UserDeckRepository: UnitOfWork {
    async fn add_user_deck(&self, link: &UserDeck) -> Result<bool, CoreError>;
    async fn get_user_decks_for_deck(&self, deck_id: DeckId) -> Result<Vec<UserDeck>, CoreError>;
    async fn get_decks_for_user(&self, user_id: UserId) -> Result<Vec<Deck>, CoreError>;
}
