use crate::repo::{DeckRepository, UnitOfWork};
use crate::service::events::{DeckEvent, DeckHooks};
use crate::service::user_deck_service::UserDeckService;
use crate::{Card, CoreError, Deck, DeckId, NewDeck, UserDeck};
use std::sync::Arc;

/// Deck operations used by the HTTP handlers and the CLI.
#[derive(Clone)]
pub struct DeckService {
    repo: Arc<dyn DeckRepository>,
    hooks: DeckHooks,
}

impl DeckService {
    pub fn new(repo: Arc<dyn DeckRepository>, hooks: DeckHooks) -> Self {
        Self { repo, hooks }
    }

    pub async fn get_all_decks_including_cards(&self) -> Result<Vec<Deck>, CoreError> {
        self.repo.get_decks().await
    }

    pub async fn get_deck_by_id(&self, id: DeckId) -> Result<Option<Deck>, CoreError> {
        self.repo.get_deck(id).await
    }

    pub async fn get_cards_in_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        self.repo.get_deck_cards(deck_id).await
    }

    pub async fn deck_exists_by_id(&self, id: DeckId) -> Result<bool, CoreError> {
        self.repo.deck_exists_by_id(id).await
    }

    pub async fn deck_exists_by_name(&self, name: &str) -> Result<bool, CoreError> {
        self.repo.deck_exists_by_name(name).await
    }

    /// Rejects blank names and names already in use.
    pub async fn check_new_deck(&self, new: &NewDeck) -> Result<(), CoreError> {
        if new.name.trim().is_empty() {
            return Err(CoreError::Validation("Deck name must not be empty.".into()));
        }
        if self.deck_exists_by_name(&new.name).await? {
            return Err(name_taken(&new.name));
        }
        Ok(())
    }

    /// Validates, stores and links a new deck to its creator.
    ///
    /// A failed ownership link does not undo the deck; it is logged instead.
    pub async fn create_deck(
        &self,
        new: NewDeck,
        owners: &UserDeckService,
    ) -> Result<Deck, CoreError> {
        self.check_new_deck(&new).await?;

        let creator_id = new.creator_id;
        let mut deck = Deck::from_new(new);
        // The store still enforces uniqueness when a concurrent create won the race.
        let saved = match self.add_deck(&mut deck).await {
            Err(CoreError::Conflict(_)) => return Err(name_taken(&deck.name)),
            other => other?,
        };
        if !saved {
            return Err(CoreError::Storage("deck not saved"));
        }

        match owners
            .add_user_deck(&UserDeck::new(creator_id, deck.id))
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!("ownership link for deck {} was not recorded", deck.id),
            Err(e) => tracing::warn!("ownership link for deck {} failed: {e}", deck.id),
        }
        Ok(deck)
    }

    /// Stores `deck`, assigning its id. Emits [`DeckEvent::Created`] once saved.
    pub async fn add_deck(&self, deck: &mut Deck) -> Result<bool, CoreError> {
        let saved = self.repo.add_deck(deck).await? && self.repo.save().await?;
        if saved {
            self.hooks.emit(DeckEvent::Created(deck.id));
        }
        Ok(saved)
    }

    /// Emits [`DeckEvent::Updated`] once saved.
    pub async fn update_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        let saved = self.repo.update_deck(deck).await? && self.repo.save().await?;
        if saved {
            self.hooks.emit(DeckEvent::Updated(deck.id));
        }
        Ok(saved)
    }

    pub async fn delete_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        Ok(self.repo.delete_deck(deck).await? && self.repo.save().await?)
    }
}

fn name_taken(name: &str) -> CoreError {
    CoreError::Validation(format!("Deck with name: {name} already exists"))
}
