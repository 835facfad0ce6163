use crate::api::routes::AppState;
use crate::api::server as api_server;
use crate::cli::opts::*;

use aikart_core::repo::memory::MemoryRepo;
use aikart_core::{
    Card, CardRepository, DeckHooks, DeckRepository, DeckService, NewDeck, UnitOfWork,
    UserDeckRepository, UserDeckService,
};
use aikart_json::paths::data_root;
use aikart_json::JsonStore;
use aikart_sqlite::SqliteRepo;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// One backend seen through each repository contract.
#[derive(Clone)]
pub struct Stores {
    pub decks: Arc<dyn DeckRepository>,
    pub cards: Arc<dyn CardRepository>,
    pub user_decks: Arc<dyn UserDeckRepository>,
}

impl Stores {
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: DeckRepository + CardRepository + UserDeckRepository + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            decks: backend.clone(),
            cards: backend.clone(),
            user_decks: backend,
        }
    }

    /// Services wired with the logging subscriber for deck events.
    pub fn app_state(&self) -> AppState {
        AppState {
            decks: DeckService::new(self.decks.clone(), DeckHooks::logging()),
            user_decks: UserDeckService::new(self.user_decks.clone()),
        }
    }
}

pub async fn run_cli(args: Cli) -> Result<()> {
    let stores = open_stores(args.store, args.data_path.clone()).await?;
    match args.cmd {
        Command::Serve(serve) => api_server::run(Arc::new(stores.app_state()), serve.addr).await,
        Command::Deck(cmd) => deck_cmd(&stores, cmd).await,
        Command::Card(cmd) => card_cmd(&stores, cmd).await,
    }
}

pub async fn open_stores(store: StoreKind, data_path: Option<PathBuf>) -> Result<Stores> {
    match store {
        StoreKind::Memory => Ok(Stores::from_backend(MemoryRepo::new())),
        StoreKind::Json => {
            let s = match data_path {
                Some(p) => JsonStore::open_file(p).await?,
                None => JsonStore::open_default().await?,
            };
            tracing::debug!("using JSON store at {}", s.path().display());
            Ok(Stores::from_backend(s))
        }
        StoreKind::Sqlite => {
            let p = data_path.unwrap_or_else(|| data_root().join("aikart.sqlite3"));
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            tracing::debug!("using SQLite store at {}", p.display());
            Ok(Stores::from_backend(SqliteRepo::open_file(&p).await?))
        }
    }
}

async fn deck_cmd(stores: &Stores, cmd: DeckCmd) -> Result<()> {
    let state = stores.app_state();
    match cmd {
        DeckCmd::Add(a) => {
            let new = NewDeck {
                name: a.name,
                description: a.description,
                is_public: a.public,
                creator_id: a.creator,
            };
            let deck = state.decks.create_deck(new, &state.user_decks).await?;
            println!("{}", deck.id);
        }
        DeckCmd::List => {
            for d in state.decks.get_all_decks_including_cards().await? {
                println!("{}\t{}\tcards={}\tcreator={}", d.id, d.name, d.cards.len(), d.creator_id);
            }
        }
        DeckCmd::Show { id } => {
            let deck = state
                .decks
                .get_deck_by_id(id)
                .await?
                .ok_or_else(|| anyhow!("deck not found: {id}"))?;
            println!("{}", serde_json::to_string_pretty(&crate::api::dto::DeckDto::from(&deck))?);
        }
        DeckCmd::Rm { id } => {
            let deck = state
                .decks
                .get_deck_by_id(id)
                .await?
                .ok_or_else(|| anyhow!("deck not found: {id}"))?;
            if !state.decks.delete_deck(&deck).await? {
                bail!("deck {id} was not deleted");
            }
            println!("ok");
        }
        DeckCmd::Owned { user } => {
            for d in state.user_decks.decks_for_user(user).await? {
                println!("{}\t{}", d.id, d.name);
            }
        }
    }
    Ok(())
}

async fn card_cmd(stores: &Stores, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let mut card = Card::new(a.deck, a.question, a.answer);
            if !(stores.cards.add_card(&mut card).await? && stores.cards.save().await?) {
                bail!("card was not saved");
            }
            println!("{}", card.id);
        }
        CardCmd::List { deck } => {
            if !stores.decks.deck_exists_by_id(deck).await? {
                bail!("deck not found: {deck}");
            }
            for c in stores.decks.get_deck_cards(deck).await? {
                println!("{}\t{}\t{}", c.id, c.question, c.answer);
            }
        }
    }
    Ok(())
}
