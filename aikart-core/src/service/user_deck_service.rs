use crate::repo::{UnitOfWork, UserDeckRepository};
use crate::{CoreError, Deck, DeckId, UserDeck, UserId};
use std::sync::Arc;

#[derive(Clone)]
pub struct UserDeckService {
    repo: Arc<dyn UserDeckRepository>,
}

impl UserDeckService {
    pub fn new(repo: Arc<dyn UserDeckRepository>) -> Self {
        Self { repo }
    }

    pub async fn add_user_deck(&self, link: &UserDeck) -> Result<bool, CoreError> {
        Ok(self.repo.add_user_deck(link).await? && self.repo.save().await?)
    }

    pub async fn owners_of(&self, deck_id: DeckId) -> Result<Vec<UserDeck>, CoreError> {
        self.repo.get_user_decks_for_deck(deck_id).await
    }

    pub async fn decks_for_user(&self, user_id: UserId) -> Result<Vec<Deck>, CoreError> {
        self.repo.get_decks_for_user(user_id).await
    }
}
