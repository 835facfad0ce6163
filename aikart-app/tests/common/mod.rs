#![allow(dead_code)]

use aikart_app::api::routes::AppState;
use aikart_app::api::server::build_router;
use aikart_app::cli::commands::Stores;
use aikart_core::repo::memory::MemoryRepo;
use aikart_core::{
    Card, CardRepository, CoreError, Deck, DeckHooks, DeckId, DeckRepository, DeckService,
    UnitOfWork, UserDeck, UserDeckRepository, UserDeckService, UserId,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub stores: Stores,
}

impl TestApp {
    pub fn new() -> Self {
        let stores = Stores::from_backend(MemoryRepo::new());
        let router = build_router(Arc::new(stores.app_state()));
        Self { router, stores }
    }

    /// Same store, but deck writes report "not applied".
    pub fn with_refusing_writes() -> Self {
        let stores = Stores::from_backend(MemoryRepo::new());
        let decks = Arc::new(RefusingWrites {
            inner: stores.decks.clone(),
        });
        let user_decks = stores.user_decks.clone();
        Self::wired(stores, decks, user_decks)
    }

    /// Name lookups always miss, as if a rival create landed between check and insert.
    pub fn with_stale_name_check() -> Self {
        let stores = Stores::from_backend(MemoryRepo::new());
        let decks = Arc::new(StaleNameCheck {
            inner: stores.decks.clone(),
        });
        let user_decks = stores.user_decks.clone();
        Self::wired(stores, decks, user_decks)
    }

    /// Decks save normally but every ownership link fails.
    pub fn with_failing_owner_links() -> Self {
        let stores = Stores::from_backend(MemoryRepo::new());
        let decks = stores.decks.clone();
        Self::wired(stores, decks, Arc::new(FailingLinks))
    }

    fn wired(
        stores: Stores,
        decks: Arc<dyn DeckRepository>,
        user_decks: Arc<dyn UserDeckRepository>,
    ) -> Self {
        let state = AppState {
            decks: DeckService::new(decks, DeckHooks::new()),
            user_decks: UserDeckService::new(user_decks),
        };
        Self {
            router: build_router(Arc::new(state)),
            stores,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> TestResponse {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get("location")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            location,
            json,
        }
    }

    pub async fn seed_deck(&self, name: &str, creator: i32) -> DeckId {
        let res = self
            .send(
                "POST",
                "/api/deck",
                Some(serde_json::json!({ "name": name, "creatorId": creator })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED);
        res.json["id"].as_i64().unwrap() as DeckId
    }

    pub async fn seed_card(&self, deck_id: DeckId, question: &str, answer: &str) -> Card {
        let mut card = Card::new(deck_id, question, answer);
        assert!(self.stores.cards.add_card(&mut card).await.unwrap());
        card
    }

    pub async fn deck_count(&self) -> usize {
        self.stores.decks.get_decks().await.unwrap().len()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub json: serde_json::Value,
}

/// Passes reads through and refuses every write with `Ok(false)`.
struct RefusingWrites {
    inner: Arc<dyn DeckRepository>,
}

#[async_trait]
impl UnitOfWork for RefusingWrites {
    async fn save(&self) -> Result<bool, CoreError> {
        Ok(false)
    }
}

#[async_trait]
impl DeckRepository for RefusingWrites {
    async fn get_decks(&self) -> Result<Vec<Deck>, CoreError> {
        self.inner.get_decks().await
    }

    async fn get_deck_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        self.inner.get_deck_cards(deck_id).await
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, CoreError> {
        self.inner.get_deck(id).await
    }

    async fn deck_exists_by_id(&self, id: DeckId) -> Result<bool, CoreError> {
        self.inner.deck_exists_by_id(id).await
    }

    async fn deck_exists_by_name(&self, name: &str) -> Result<bool, CoreError> {
        self.inner.deck_exists_by_name(name).await
    }

    async fn add_deck(&self, _deck: &mut Deck) -> Result<bool, CoreError> {
        Ok(false)
    }

    async fn delete_deck(&self, _deck: &Deck) -> Result<bool, CoreError> {
        Ok(false)
    }

    async fn update_deck(&self, _deck: &Deck) -> Result<bool, CoreError> {
        Ok(false)
    }
}

struct StaleNameCheck {
    inner: Arc<dyn DeckRepository>,
}

#[async_trait]
impl UnitOfWork for StaleNameCheck {
    async fn save(&self) -> Result<bool, CoreError> {
        self.inner.save().await
    }
}

#[async_trait]
impl DeckRepository for StaleNameCheck {
    async fn get_decks(&self) -> Result<Vec<Deck>, CoreError> {
        self.inner.get_decks().await
    }

    async fn get_deck_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        self.inner.get_deck_cards(deck_id).await
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, CoreError> {
        self.inner.get_deck(id).await
    }

    async fn deck_exists_by_id(&self, id: DeckId) -> Result<bool, CoreError> {
        self.inner.deck_exists_by_id(id).await
    }

    async fn deck_exists_by_name(&self, _name: &str) -> Result<bool, CoreError> {
        Ok(false)
    }

    async fn add_deck(&self, deck: &mut Deck) -> Result<bool, CoreError> {
        self.inner.add_deck(deck).await
    }

    async fn delete_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        self.inner.delete_deck(deck).await
    }

    async fn update_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        self.inner.update_deck(deck).await
    }
}

struct FailingLinks;

#[async_trait]
impl UnitOfWork for FailingLinks {
    async fn save(&self) -> Result<bool, CoreError> {
        Err(CoreError::Storage("io"))
    }
}

#[async_trait]
impl UserDeckRepository for FailingLinks {
    async fn add_user_deck(&self, _link: &UserDeck) -> Result<bool, CoreError> {
        Err(CoreError::Storage("insert user deck"))
    }

    async fn get_user_decks_for_deck(&self, _deck_id: DeckId) -> Result<Vec<UserDeck>, CoreError> {
        Ok(Vec::new())
    }

    async fn get_decks_for_user(&self, _user_id: UserId) -> Result<Vec<Deck>, CoreError> {
        Ok(Vec::new())
    }
}
