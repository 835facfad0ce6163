use aikart_core::{CoreError, Deck, DeckId, DeckPatch, DeckService, NewDeck, UserDeckService};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AddDeckDto, CardDto, DeckDto, UpdateDeckDto};
use crate::api::error::{ApiError, ApiResult};
use crate::api::server::DECK_BASE;

pub struct AppState {
    pub decks: DeckService,
    pub user_decks: UserDeckService,
}

/// Body extractor result: unreadable bodies and a literal `null` both count as missing.
type Payload<T> = Result<Json<Option<T>>, JsonRejection>;

fn require<T>(payload: Payload<T>, message: &str) -> ApiResult<T> {
    match payload {
        Ok(Json(Some(body))) => Ok(body),
        Ok(Json(None)) => Err(ApiError::BadRequest(message.to_string())),
        Err(rejection) => Err(ApiError::BadRequest(format!("{message} ({})", rejection.body_text()))),
    }
}

/// Existence check followed by the fetch; both must find the deck.
async fn find_deck(decks: &DeckService, deck_id: DeckId) -> ApiResult<Deck> {
    if !decks.deck_exists_by_id(deck_id).await? {
        return Err(ApiError::deck_not_found(deck_id));
    }
    decks
        .get_deck_by_id(deck_id)
        .await?
        .ok_or_else(|| ApiError::deck_not_found(deck_id))
}

/// `GET /api/deck`
pub async fn get_all_decks(State(st): State<Arc<AppState>>) -> ApiResult<Json<Vec<DeckDto>>> {
    let decks = st.decks.get_all_decks_including_cards().await?;
    Ok(Json(decks.iter().map(DeckDto::from).collect()))
}

/// `GET /api/deck/{deckId}`
pub async fn get_deck(
    State(st): State<Arc<AppState>>,
    Path(deck_id): Path<DeckId>,
) -> ApiResult<Json<DeckDto>> {
    let deck = find_deck(&st.decks, deck_id).await?;
    Ok(Json(DeckDto::from(&deck)))
}

/// `GET /api/deck/cardlist/{deckId}`
pub async fn get_cards_in_deck(
    State(st): State<Arc<AppState>>,
    Path(deck_id): Path<DeckId>,
) -> ApiResult<Json<Vec<CardDto>>> {
    if !st.decks.deck_exists_by_id(deck_id).await? {
        return Err(ApiError::deck_not_found(deck_id));
    }
    let cards = st.decks.get_cards_in_deck(deck_id).await?;
    Ok(Json(cards.iter().map(CardDto::from).collect()))
}

/// `POST /api/deck`
pub async fn add_deck(
    State(st): State<Arc<AppState>>,
    payload: Payload<AddDeckDto>,
) -> ApiResult<impl IntoResponse> {
    let dto = require(payload, "Deck data must be provided.")?;

    let deck = match st.decks.create_deck(NewDeck::from(dto), &st.user_decks).await {
        Ok(deck) => deck,
        Err(CoreError::Storage(what)) => {
            tracing::error!("saving new deck failed: {what}");
            return Err(ApiError::Internal("Something went wrong while saving deck".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let location = format!("{DECK_BASE}/{}", deck.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(DeckDto::from(&deck)),
    ))
}

/// `PUT /api/deck/{deckId}`
pub async fn update_deck(
    State(st): State<Arc<AppState>>,
    Path(deck_id): Path<DeckId>,
    payload: Payload<UpdateDeckDto>,
) -> ApiResult<StatusCode> {
    let dto = require(payload, "Update data must be provided.")?;
    let mut deck = find_deck(&st.decks, deck_id).await?;

    DeckPatch::from(dto).apply(&mut deck);

    match st.decks.update_deck(&deck).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::Internal("Something went wrong updating deck".into())),
        Err(e) => {
            tracing::error!("updating deck {deck_id} failed: {e}");
            Err(ApiError::Internal("Something went wrong updating deck".into()))
        }
    }
}

/// `DELETE /api/deck/{deckId}`
pub async fn delete_deck(
    State(st): State<Arc<AppState>>,
    Path(deck_id): Path<DeckId>,
) -> ApiResult<StatusCode> {
    let deck = find_deck(&st.decks, deck_id).await?;

    match st.decks.delete_deck(&deck).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::Internal(
            "Something went wrong while deleting the deck".into(),
        )),
        Err(e) => {
            tracing::error!("deleting deck {deck_id} failed: {e}");
            Err(ApiError::Internal(
                "Something went wrong while deleting the deck".into(),
            ))
        }
    }
}
