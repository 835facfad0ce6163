use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type DeckId = i32;
pub type CardId = i32;
pub type UserId = i32;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Populated by the repository on reads; ignored on writes.
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Deck {
    /// Builds the entity a store will persist. `id` stays 0 until the store assigns one.
    pub fn from_new(new: NewDeck) -> Self {
        Self {
            id: 0,
            name: new.name,
            description: new.description,
            is_public: new.is_public,
            creator_id: new.creator_id,
            created_at: Utc::now(),
            cards: Vec::new(),
        }
    }
}

/// Creation payload in domain form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDeck {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub creator_id: UserId,
}

impl NewDeck {
    pub fn new(name: impl Into<String>, creator_id: UserId) -> Self {
        Self {
            name: name.into(),
            description: None,
            is_public: false,
            creator_id,
        }
    }
}

/// Field-level update. `None` leaves the deck's current value untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeckPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl DeckPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_public.is_none()
    }

    pub fn apply(self, deck: &mut Deck) {
        if let Some(name) = self.name {
            deck.name = name;
        }
        if let Some(description) = self.description {
            deck.description = Some(description);
        }
        if let Some(is_public) = self.is_public {
            deck.is_public = is_public;
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(deck_id: DeckId, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: 0,
            deck_id,
            question: question.into(),
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ownership link between a user and a deck.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDeck {
    pub user_id: UserId,
    pub deck_id: DeckId,
    pub created_at: DateTime<Utc>,
}

impl UserDeck {
    pub fn new(user_id: UserId, deck_id: DeckId) -> Self {
        Self {
            user_id,
            deck_id,
            created_at: Utc::now(),
        }
    }
}
