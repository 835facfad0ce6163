use aikart_core::repo::memory::MemoryRepo;
use aikart_core::{
    Card, CardRepository, CoreError, Deck, DeckHooks, DeckPatch, DeckService, NewDeck, UserDeck,
    UserDeckService,
};
use std::sync::Arc;

fn services() -> (DeckService, UserDeckService, Arc<MemoryRepo>) {
    let repo = Arc::new(MemoryRepo::new());
    let decks = DeckService::new(repo.clone(), DeckHooks::logging());
    let owners = UserDeckService::new(repo.clone());
    (decks, owners, repo)
}

async fn create(decks: &DeckService, owners: &UserDeckService, name: &str, creator: i32) -> Deck {
    let new = NewDeck::new(name, creator);
    decks.check_new_deck(&new).await.unwrap();
    let mut deck = Deck::from_new(new);
    assert!(decks.add_deck(&mut deck).await.unwrap());
    assert!(owners.add_user_deck(&UserDeck::new(creator, deck.id)).await.unwrap());
    deck
}

#[tokio::test]
async fn created_deck_is_fetchable_by_its_id() {
    let (decks, owners, _) = services();
    let deck = create(&decks, &owners, "Speed Deck", 7).await;

    assert_eq!(deck.id, 1);
    assert!(decks.deck_exists_by_id(1).await.unwrap());
    let fetched = decks.get_deck_by_id(1).await.unwrap().unwrap();
    assert_eq!(fetched.id, deck.id);
    assert_eq!(fetched.name, "Speed Deck");
}

#[tokio::test]
async fn ownership_is_tracked_per_user() {
    let (decks, owners, _) = services();
    let a = create(&decks, &owners, "Verbs", 1).await;
    create(&decks, &owners, "Nouns", 2).await;

    let mine = owners.decks_for_user(1).await.unwrap();
    assert_eq!(mine.iter().map(|d| d.id).collect::<Vec<_>>(), vec![a.id]);
    assert_eq!(owners.owners_of(a.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn validation_leaves_store_untouched() {
    let (decks, owners, _) = services();
    create(&decks, &owners, "Verbs", 1).await;

    for name in ["", "  ", "Verbs", "VERBS"] {
        let err = decks.check_new_deck(&NewDeck::new(name, 1)).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)), "{name:?}");
    }
    assert_eq!(decks.get_all_decks_including_cards().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_keeps_cards_and_untouched_fields() {
    let (decks, owners, repo) = services();
    let deck = create(&decks, &owners, "Verbs", 1).await;
    let mut card = Card::new(deck.id, "iku", "to go");
    repo.add_card(&mut card).await.unwrap();

    let mut current = decks.get_deck_by_id(deck.id).await.unwrap().unwrap();
    DeckPatch {
        description: Some("motion".into()),
        ..Default::default()
    }
    .apply(&mut current);
    assert!(decks.update_deck(&current).await.unwrap());

    let after = decks.get_deck_by_id(deck.id).await.unwrap().unwrap();
    assert_eq!(after.name, "Verbs");
    assert_eq!(after.description.as_deref(), Some("motion"));
    assert_eq!(after.cards, vec![card]);
    assert_eq!(decks.get_cards_in_deck(deck.id).await.unwrap().len(), 1);
}
