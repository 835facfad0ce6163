use aikart_core::repo::{CardRepository, DeckRepository, UnitOfWork, UserDeckRepository};
use aikart_core::{Card, CoreError, Deck, DeckId, UserDeck, UserId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|e| storage("sqlite connect", e))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Private in-memory database. Pinned to one connection so every query sees the same data.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| storage("sqlite options", e))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|e| storage("sqlite connect", e))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS decks (
          id          INTEGER PRIMARY KEY AUTOINCREMENT,
          name        TEXT    NOT NULL COLLATE NOCASE UNIQUE,
          description TEXT,
          is_public   INTEGER NOT NULL DEFAULT 0,
          creator_id  INTEGER NOT NULL,
          created_at  TEXT    NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
          id          INTEGER PRIMARY KEY AUTOINCREMENT,
          deck_id     INTEGER NOT NULL,
          question    TEXT    NOT NULL,
          answer      TEXT    NOT NULL,
          created_at  TEXT    NOT NULL,
          FOREIGN KEY(deck_id) REFERENCES decks(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS user_decks (
          user_id     INTEGER NOT NULL,
          deck_id     INTEGER NOT NULL,
          created_at  TEXT    NOT NULL,
          PRIMARY KEY (user_id, deck_id),
          FOREIGN KEY(deck_id) REFERENCES decks(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards (deck_id);
        CREATE INDEX IF NOT EXISTS idx_user_decks_deck ON user_decks (deck_id);
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| storage("sqlite schema", e))?;
        }
        Ok(())
    }

    async fn cards_by_deck(&self) -> Result<BTreeMap<DeckId, Vec<Card>>, CoreError> {
        let rows = sqlx::query(
            "SELECT id,deck_id,question,answer,created_at FROM cards ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("list cards", e))?;
        let mut by_deck: BTreeMap<DeckId, Vec<Card>> = BTreeMap::new();
        for row in rows {
            let card = row_into_card(row)?;
            by_deck.entry(card.deck_id).or_default().push(card);
        }
        Ok(by_deck)
    }

    async fn exists(&self, sql: &'static str, id: i32) -> Result<bool, CoreError> {
        Ok(sqlx::query(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("read deck", e))?
            .is_some())
    }
}

#[async_trait::async_trait]
impl UnitOfWork for SqliteRepo {
    // Every write statement autocommits.
    async fn save(&self) -> Result<bool, CoreError> {
        Ok(true)
    }
}

#[async_trait::async_trait]
impl DeckRepository for SqliteRepo {
    async fn get_decks(&self) -> Result<Vec<Deck>, CoreError> {
        let rows = sqlx::query(
            "SELECT id,name,description,is_public,creator_id,created_at FROM decks ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("list decks", e))?;
        let mut cards = self.cards_by_deck().await?;
        let mut v = Vec::with_capacity(rows.len());
        for row in rows {
            let mut deck = row_into_deck(row)?;
            deck.cards = cards.remove(&deck.id).unwrap_or_default();
            v.push(deck);
        }
        Ok(v)
    }

    async fn get_deck_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        let rows = sqlx::query(
            "SELECT id,deck_id,question,answer,created_at FROM cards WHERE deck_id=? ORDER BY id ASC",
        )
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("list cards", e))?;
        rows.into_iter().map(row_into_card).collect()
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, CoreError> {
        let row = sqlx::query(
            "SELECT id,name,description,is_public,creator_id,created_at FROM decks WHERE id=?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("read deck", e))?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut deck = row_into_deck(row)?;
        deck.cards = self.get_deck_cards(id).await?;
        Ok(Some(deck))
    }

    async fn deck_exists_by_id(&self, id: DeckId) -> Result<bool, CoreError> {
        self.exists("SELECT 1 FROM decks WHERE id=? LIMIT 1", id).await
    }

    async fn deck_exists_by_name(&self, name: &str) -> Result<bool, CoreError> {
        Ok(sqlx::query("SELECT 1 FROM decks WHERE name=? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage("read deck", e))?
            .is_some())
    }

    async fn add_deck(&self, deck: &mut Deck) -> Result<bool, CoreError> {
        let id: i32 = sqlx::query_scalar(
            r#"INSERT INTO decks (name,description,is_public,creator_id,created_at)
               VALUES (?,?,?,?,?)
               RETURNING id"#,
        )
        .bind(&deck.name)
        .bind(deck.description.clone())
        .bind(bool_to_i(deck.is_public))
        .bind(deck.creator_id)
        .bind(dt_to_str(deck.created_at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("insert deck", e))?;
        deck.id = id;
        Ok(true)
    }

    async fn delete_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage("tx", e))?;

        // Manual cascade, independent of the foreign_keys pragma
        sqlx::query("DELETE FROM user_decks WHERE deck_id=?")
            .bind(deck.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("del user decks", e))?;

        sqlx::query("DELETE FROM cards WHERE deck_id=?")
            .bind(deck.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("del cards", e))?;

        let res = sqlx::query("DELETE FROM decks WHERE id=?")
            .bind(deck.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage("del deck", e))?;
        if res.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Ok(false);
        }

        tx.commit().await.map_err(|e| storage("tx commit", e))?;
        Ok(true)
    }

    async fn update_deck(&self, deck: &Deck) -> Result<bool, CoreError> {
        let res = sqlx::query(
            r#"UPDATE decks SET name=?, description=?, is_public=?, creator_id=?
               WHERE id=?"#,
        )
        .bind(&deck.name)
        .bind(deck.description.clone())
        .bind(bool_to_i(deck.is_public))
        .bind(deck.creator_id)
        .bind(deck.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("update deck", e))?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl CardRepository for SqliteRepo {
    async fn add_card(&self, card: &mut Card) -> Result<bool, CoreError> {
        if !self.deck_exists_by_id(card.deck_id).await? {
            return Err(CoreError::NotFound("deck"));
        }
        let id: i32 = sqlx::query_scalar(
            r#"INSERT INTO cards (deck_id,question,answer,created_at)
               VALUES (?,?,?,?)
               RETURNING id"#,
        )
        .bind(card.deck_id)
        .bind(&card.question)
        .bind(&card.answer)
        .bind(dt_to_str(card.created_at))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage("insert card", e))?;
        card.id = id;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl UserDeckRepository for SqliteRepo {
    async fn add_user_deck(&self, link: &UserDeck) -> Result<bool, CoreError> {
        if !self.deck_exists_by_id(link.deck_id).await? {
            return Err(CoreError::NotFound("deck"));
        }
        let res = sqlx::query(
            "INSERT OR IGNORE INTO user_decks (user_id,deck_id,created_at) VALUES (?,?,?)",
        )
        .bind(link.user_id)
        .bind(link.deck_id)
        .bind(dt_to_str(link.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| storage("insert user deck", e))?;
        Ok(res.rows_affected() > 0)
    }

    async fn get_user_decks_for_deck(&self, deck_id: DeckId) -> Result<Vec<UserDeck>, CoreError> {
        let rows = sqlx::query(
            "SELECT user_id,deck_id,created_at FROM user_decks WHERE deck_id=? ORDER BY user_id ASC",
        )
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("list user decks", e))?;
        let mut v = Vec::with_capacity(rows.len());
        for row in rows {
            v.push(UserDeck {
                user_id: row.get::<i32, _>("user_id"),
                deck_id: row.get::<i32, _>("deck_id"),
                created_at: dt_from_str(row.get::<String, _>("created_at"))?,
            });
        }
        Ok(v)
    }

    async fn get_decks_for_user(&self, user_id: UserId) -> Result<Vec<Deck>, CoreError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT deck_id FROM user_decks WHERE user_id=? ORDER BY deck_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("list user decks", e))?;
        let mut v = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(deck) = self.get_deck(id).await? {
                v.push(deck);
            }
        }
        Ok(v)
    }
}

// ===== Helpers =====
fn storage(what: &'static str, e: sqlx::Error) -> CoreError {
    tracing::error!("{what}: {e}");
    CoreError::Storage(what)
}

fn write_error(what: &'static str, e: sqlx::Error) -> CoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CoreError::Conflict("deck name already exists")
        }
        _ => storage(what, e),
    }
}

fn dt_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn dt_from_str(s: String) -> Result<DateTime<Utc>, CoreError> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map_err(|_| CoreError::Invalid("datetime"))
        .map(|dt| dt.with_timezone(&Utc))
}

fn bool_to_i(b: bool) -> i64 {
    if b {
        1
    } else {
        0
    }
}

fn row_into_deck(row: SqliteRow) -> Result<Deck, CoreError> {
    Ok(Deck {
        id: row.get::<i32, _>("id"),
        name: row.get::<String, _>("name"),
        description: row.get::<Option<String>, _>("description"),
        is_public: row.get::<i64, _>("is_public") != 0,
        creator_id: row.get::<i32, _>("creator_id"),
        created_at: dt_from_str(row.get::<String, _>("created_at"))?,
        cards: Vec::new(),
    })
}

fn row_into_card(row: SqliteRow) -> Result<Card, CoreError> {
    Ok(Card {
        id: row.get::<i32, _>("id"),
        deck_id: row.get::<i32, _>("deck_id"),
        question: row.get::<String, _>("question"),
        answer: row.get::<String, _>("answer"),
        created_at: dt_from_str(row.get::<String, _>("created_at"))?,
    })
}
