use aikart_core::repo::memory::{Snapshot, Tables};
use aikart_core::repo::{CardRepository, DeckRepository, UnitOfWork, UserDeckRepository};
use aikart_core::{Card, CoreError, Deck, DeckId, UserDeck, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(flatten)]
    rows: Snapshot,
}

struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tables: Tables,
    // Tables as of the last successful save; restored when a save fails.
    durable: Tables,
    // Bumped by every applied write; `saved` trails it until the next save.
    revision: u64,
    saved: u64,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            tables: Tables::default(),
            durable: Tables::default(),
            revision: 0,
            saved: 0,
        }
    }

    fn to_image(&self) -> FileImage {
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            rows: self.tables.snapshot(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            tables: Tables::from_snapshot(img.rows.clone()),
            durable: Tables::from_snapshot(img.rows),
            revision: 0,
            saved: 0,
        }
    }

    fn touched(&mut self, applied: bool) -> bool {
        if applied {
            self.revision += 1;
        }
        applied
    }
}

/// Deck store kept in memory and committed to a single JSON file on `save`.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    // Held from snapshot to rename so files land in revision order.
    commit_lock: Mutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_file(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let backups = paths::backups_beside(&path);
        Self::open_with(path, backups, 10).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path, &backups_dir).await?;
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
            commit_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when writes have been applied since the last successful save.
    pub fn has_pending_changes(&self) -> bool {
        let s = self.state.read();
        s.revision != s.saved
    }

    /// Writes every applied change to disk.
    ///
    /// On failure the in-memory tables fall back to the last saved state, so
    /// readers never see rows that are not on disk.
    async fn commit(&self) -> Result<bool, CoreError> {
        let _guard = self.commit_lock.lock().await;
        let (image, tables, revision) = {
            let mut s = self.state.write();
            if s.revision == s.saved {
                return Ok(true);
            }
            s.updated_at = Utc::now();
            (s.to_image(), s.tables.clone(), s.revision)
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        let written = task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &image))
            .await
            .map_err(|_| CoreError::Storage("io"))
            .and_then(|r| {
                r.map_err(|e| {
                    tracing::error!("writing deck store failed: {e}");
                    CoreError::Storage("io")
                })
            });

        let mut s = self.state.write();
        match written {
            Ok(()) => {
                s.durable = tables;
                s.saved = revision;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("discarding {} unsaved write(s)", s.revision - s.saved);
                s.tables = s.durable.clone();
                s.revision = s.saved;
                Err(e)
            }
        }
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let buf = fs::read_to_string(&p)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("io")))?;
        if img.version != FILE_VERSION {
            return Err(CoreError::Invalid("store file version"));
        }
        Ok(State::from_image(img))
    } else {
        let st = State::new_empty();
        write_with_backup(path, backups_dir, 1, &st.to_image())
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup_path = backups_dir.join(format!("aikart-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

#[async_trait]
impl UnitOfWork for JsonStore {
    async fn save(&self) -> Result<bool, CoreError> {
        self.commit().await
    }
}

#[async_trait]
impl DeckRepository for JsonStore {
    async fn get_decks(&self) -> Result<Vec<Deck>, CoreError> {
        Ok(self.state.read().tables.decks_with_cards())
    }

    async fn get_deck_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        Ok(self.state.read().tables.cards_of(deck_id))
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, CoreError> {
        Ok(self.state.read().tables.deck(id))
    }

    async fn deck_exists_by_id(&self, id: DeckId) -> Result<bool, CoreError> {
        Ok(self.state.read().tables.contains_deck(id))
    }

    async fn deck_exists_by_name(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.state.read().tables.contains_name(name))
    }

    async fn add_deck(&self, deck: &mut Deck) -> Result<bool, CoreError> {
        let mut s = self.state.write();
        let applied = s.tables.insert_deck(deck)?;
        Ok(s.touched(applied))
    }

    async fn delete_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        let mut s = self.state.write();
        let applied = s.tables.remove_deck(deck.id);
        Ok(s.touched(applied))
    }

    async fn update_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        let mut s = self.state.write();
        let applied = s.tables.update_deck(deck)?;
        Ok(s.touched(applied))
    }
}

#[async_trait]
impl CardRepository for JsonStore {
    async fn add_card(&self, card: &mut Card) -> Result<bool, CoreError> {
        let mut s = self.state.write();
        let applied = s.tables.insert_card(card)?;
        Ok(s.touched(applied))
    }
}

#[async_trait]
impl UserDeckRepository for JsonStore {
    async fn add_user_deck(&self, link: &UserDeck) -> Result<bool, CoreError> {
        let mut s = self.state.write();
        let applied = s.tables.insert_user_deck(link)?;
        Ok(s.touched(applied))
    }

    async fn get_user_decks_for_deck(&self, deck_id: DeckId) -> Result<Vec<UserDeck>, CoreError> {
        Ok(self.state.read().tables.user_decks_for_deck(deck_id))
    }

    async fn get_decks_for_user(&self, user_id: UserId) -> Result<Vec<Deck>, CoreError> {
        Ok(self.state.read().tables.decks_for_user(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aikart_core::NewDeck;
    use tempfile::TempDir;

    async fn open_in(dir: &TempDir, keep: usize) -> JsonStore {
        JsonStore::open_with(dir.path().join("aikart.json"), dir.path().join("backups"), keep)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn saved_writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_in(&dir, 3).await;
            let mut deck = Deck::from_new(NewDeck::new("Speed Deck", 7));
            assert!(store.add_deck(&mut deck).await.unwrap());
            let mut card = Card::new(deck.id, "q", "a");
            store.add_card(&mut card).await.unwrap();
            store.add_user_deck(&UserDeck::new(7, deck.id)).await.unwrap();
            assert!(store.has_pending_changes());
            assert!(store.save().await.unwrap());
            assert!(!store.has_pending_changes());
        }

        let store = open_in(&dir, 3).await;
        let deck = store.get_deck(1).await.unwrap().unwrap();
        assert_eq!(deck.name, "Speed Deck");
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(store.get_decks_for_user(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsaved_writes_are_not_on_disk() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_in(&dir, 3).await;
            let mut deck = Deck::from_new(NewDeck::new("Draft", 1));
            store.add_deck(&mut deck).await.unwrap();
        }
        let store = open_in(&dir, 3).await;
        assert!(store.get_decks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_writes_leave_nothing_pending() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir, 3).await;
        let mut ghost = Deck::from_new(NewDeck::new("ghost", 1));
        ghost.id = 4;
        assert!(!store.update_deck(&ghost).await.unwrap());
        assert!(!store.delete_deck(&ghost).await.unwrap());
        assert!(!store.has_pending_changes());
    }

    #[tokio::test]
    async fn backups_are_rotated() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir, 1).await;
        for name in ["a", "b", "c"] {
            let mut deck = Deck::from_new(NewDeck::new(name, 1));
            store.add_deck(&mut deck).await.unwrap();
            store.save().await.unwrap();
        }
        let backups = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert_eq!(backups, 1);
    }

    #[tokio::test]
    async fn failed_save_drops_unsaved_writes() {
        let dir = TempDir::new().unwrap();
        let store = open_in(&dir, 3).await;
        let mut deck = Deck::from_new(NewDeck::new("Speed Deck", 7));
        store.add_deck(&mut deck).await.unwrap();
        store.save().await.unwrap();

        // A plain file where the backups directory should be makes every write fail.
        let backups = dir.path().join("backups");
        fs::remove_dir_all(&backups).unwrap();
        fs::write(&backups, b"").unwrap();

        let mut renamed = deck.clone();
        renamed.name = "Renamed".into();
        assert!(store.update_deck(&renamed).await.unwrap());
        let mut extra = Deck::from_new(NewDeck::new("Extra", 7));
        assert!(store.add_deck(&mut extra).await.unwrap());

        assert!(store.save().await.is_err());
        assert!(!store.has_pending_changes());
        assert_eq!(store.get_deck(deck.id).await.unwrap().unwrap().name, "Speed Deck");
        assert!(!store.deck_exists_by_name("Extra").await.unwrap());
        assert_eq!(store.get_decks().await.unwrap().len(), 1);

        fs::remove_file(&backups).unwrap();
        drop(store);
        let store = open_in(&dir, 3).await;
        assert_eq!(store.get_deck(deck.id).await.unwrap().unwrap().name, "Speed Deck");
        assert_eq!(store.get_decks().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_keep_every_deck() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(open_in(&dir, 3).await);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let mut deck = Deck::from_new(NewDeck::new(format!("deck-{i}"), 1));
                store.add_deck(&mut deck).await.unwrap();
                store.save().await.unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        assert!(!store.has_pending_changes());

        drop(store);
        let store = open_in(&dir, 3).await;
        assert_eq!(store.get_decks().await.unwrap().len(), 16);
    }
}
