use aikart_core::{Card, CardId, Deck, DeckId, DeckPatch, NewDeck, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeckDto {
    pub id: DeckId,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub creator_id: UserId,
    pub created_at: DateTime<Utc>,
    pub cards: Vec<CardDto>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub id: CardId,
    pub deck_id: DeckId,
    pub question: String,
    pub answer: String,
}

/// Body of `POST /api/deck`. Missing fields fall back to their defaults so that
/// an absent name reaches validation instead of failing deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDeckDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub creator_id: UserId,
}

/// Body of `PUT /api/deck/{deckId}`. Only present fields are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl From<&Card> for CardDto {
    fn from(c: &Card) -> Self {
        Self {
            id: c.id,
            deck_id: c.deck_id,
            question: c.question.clone(),
            answer: c.answer.clone(),
        }
    }
}

impl From<&Deck> for DeckDto {
    fn from(d: &Deck) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            description: d.description.clone(),
            is_public: d.is_public,
            creator_id: d.creator_id,
            created_at: d.created_at,
            cards: d.cards.iter().map(CardDto::from).collect(),
        }
    }
}

impl From<AddDeckDto> for NewDeck {
    fn from(dto: AddDeckDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            is_public: dto.is_public,
            creator_id: dto.creator_id,
        }
    }
}

impl From<UpdateDeckDto> for DeckPatch {
    fn from(dto: UpdateDeckDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            is_public: dto.is_public,
        }
    }
}
