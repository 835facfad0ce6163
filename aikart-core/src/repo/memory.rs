use crate::repo::{CardRepository, DeckRepository, UnitOfWork, UserDeckRepository};
use crate::{Card, CardId, CoreError, Deck, DeckId, UserDeck, UserId};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat row dump of [`Tables`], used by stores that persist to disk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub decks: Vec<Deck>,
    pub cards: Vec<Card>,
    pub user_decks: Vec<UserDeck>,
    /// Highest ids ever handed out, so deleted ids are not reused after a reload.
    #[serde(default)]
    pub last_deck_id: DeckId,
    #[serde(default)]
    pub last_card_id: CardId,
}

/// In-process tables with id assignment and the cascade rules every store follows.
#[derive(Clone, Debug, Default)]
pub struct Tables {
    decks: BTreeMap<DeckId, Deck>,
    cards: BTreeMap<CardId, Card>,
    user_decks: Vec<UserDeck>,
    last_deck_id: DeckId,
    last_card_id: CardId,
}

impl Tables {
    pub fn from_snapshot(snap: Snapshot) -> Self {
        let mut t = Self {
            last_deck_id: snap.last_deck_id,
            last_card_id: snap.last_card_id,
            ..Self::default()
        };
        for mut d in snap.decks {
            d.cards.clear();
            t.last_deck_id = t.last_deck_id.max(d.id);
            t.decks.insert(d.id, d);
        }
        for c in snap.cards {
            t.last_card_id = t.last_card_id.max(c.id);
            t.cards.insert(c.id, c);
        }
        t.user_decks = snap.user_decks;
        t
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            decks: self.decks.values().cloned().collect(),
            cards: self.cards.values().cloned().collect(),
            user_decks: self.user_decks.clone(),
            last_deck_id: self.last_deck_id,
            last_card_id: self.last_card_id,
        }
    }

    pub fn decks_with_cards(&self) -> Vec<Deck> {
        self.decks.values().map(|d| self.attach_cards(d)).collect()
    }

    pub fn deck(&self, id: DeckId) -> Option<Deck> {
        self.decks.get(&id).map(|d| self.attach_cards(d))
    }

    pub fn cards_of(&self, deck_id: DeckId) -> Vec<Card> {
        self.cards
            .values()
            .filter(|c| c.deck_id == deck_id)
            .cloned()
            .collect()
    }

    pub fn contains_deck(&self, id: DeckId) -> bool {
        self.decks.contains_key(&id)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.decks.values().any(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn insert_deck(&mut self, deck: &mut Deck) -> Result<bool, CoreError> {
        if self.contains_name(&deck.name) {
            return Err(CoreError::Conflict("deck name already exists"));
        }
        self.last_deck_id += 1;
        deck.id = self.last_deck_id;
        let mut stored = deck.clone();
        stored.cards.clear();
        self.decks.insert(stored.id, stored);
        Ok(true)
    }

    pub fn update_deck(&mut self, deck: &Deck) -> Result<bool, CoreError> {
        if !self.decks.contains_key(&deck.id) {
            return Ok(false);
        }
        if self
            .decks
            .values()
            .any(|d| d.id != deck.id && d.name.eq_ignore_ascii_case(&deck.name))
        {
            return Err(CoreError::Conflict("deck name already exists"));
        }
        let mut stored = deck.clone();
        stored.cards.clear();
        self.decks.insert(stored.id, stored);
        Ok(true)
    }

    pub fn remove_deck(&mut self, id: DeckId) -> bool {
        if self.decks.remove(&id).is_none() {
            return false;
        }
        self.cards.retain(|_, c| c.deck_id != id);
        self.user_decks.retain(|l| l.deck_id != id);
        true
    }

    pub fn insert_card(&mut self, card: &mut Card) -> Result<bool, CoreError> {
        if !self.decks.contains_key(&card.deck_id) {
            return Err(CoreError::NotFound("deck"));
        }
        self.last_card_id += 1;
        card.id = self.last_card_id;
        self.cards.insert(card.id, card.clone());
        Ok(true)
    }

    pub fn insert_user_deck(&mut self, link: &UserDeck) -> Result<bool, CoreError> {
        if !self.decks.contains_key(&link.deck_id) {
            return Err(CoreError::NotFound("deck"));
        }
        if self
            .user_decks
            .iter()
            .any(|l| l.user_id == link.user_id && l.deck_id == link.deck_id)
        {
            return Ok(false);
        }
        self.user_decks.push(link.clone());
        Ok(true)
    }

    pub fn user_decks_for_deck(&self, deck_id: DeckId) -> Vec<UserDeck> {
        self.user_decks
            .iter()
            .filter(|l| l.deck_id == deck_id)
            .cloned()
            .collect()
    }

    pub fn decks_for_user(&self, user_id: UserId) -> Vec<Deck> {
        let mut ids: Vec<DeckId> = self
            .user_decks
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.deck_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().filter_map(|id| self.deck(id)).collect()
    }

    fn attach_cards(&self, deck: &Deck) -> Deck {
        let mut d = deck.clone();
        d.cards = self.cards_of(deck.id);
        d
    }
}

#[derive(Default)]
pub struct MemoryRepo {
    tables: RwLock<Tables>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitOfWork for MemoryRepo {
    async fn save(&self) -> Result<bool, CoreError> {
        Ok(true)
    }
}

#[async_trait]
impl DeckRepository for MemoryRepo {
    async fn get_decks(&self) -> Result<Vec<Deck>, CoreError> {
        Ok(self.tables.read().decks_with_cards())
    }

    async fn get_deck_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        Ok(self.tables.read().cards_of(deck_id))
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, CoreError> {
        Ok(self.tables.read().deck(id))
    }

    async fn deck_exists_by_id(&self, id: DeckId) -> Result<bool, CoreError> {
        Ok(self.tables.read().contains_deck(id))
    }

    async fn deck_exists_by_name(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.tables.read().contains_name(name))
    }

    async fn add_deck(&self, deck: &mut Deck) -> Result<bool, CoreError> {
        self.tables.write().insert_deck(deck)
    }

    async fn delete_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        Ok(self.tables.write().remove_deck(deck.id))
    }

    async fn update_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        self.tables.write().update_deck(deck)
    }
}

#[async_trait]
impl CardRepository for MemoryRepo {
    async fn add_card(&self, card: &mut Card) -> Result<bool, CoreError> {
        self.tables.write().insert_card(card)
    }
}

#[async_trait]
impl UserDeckRepository for MemoryRepo {
    async fn add_user_deck(&self, link: &UserDeck) -> Result<bool, CoreError> {
        self.tables.write().insert_user_deck(link)
    }

    async fn get_user_decks_for_deck(&self, deck_id: DeckId) -> Result<Vec<UserDeck>, CoreError> {
        Ok(self.tables.read().user_decks_for_deck(deck_id))
    }

    async fn get_decks_for_user(&self, user_id: UserId) -> Result<Vec<Deck>, CoreError> {
        Ok(self.tables.read().decks_for_user(user_id))
    }
}
