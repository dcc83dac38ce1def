//! SQLite-backed conversation store.
//!
//! Timestamps are stored as RFC 3339 TEXT so rows stay readable and
//! lexicographic order matches chronological order. Messages additionally
//! order by rowid, which disambiguates writes within the same second.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

use crate::domain::agent::MessageOrigin;
use crate::domain::foundation::{KnowledgeBaseId, MessageId, SessionId, Timestamp};
use crate::ports::{
    ConversationStore, IngestedFileRecord, KnowledgeBaseRecord, KnowledgeBaseStats,
    SessionRecord, StoreError, StoredMessage,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS knowledge_bases (
    id          TEXT PRIMARY KEY,
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id             TEXT PRIMARY KEY,
    knowledge_base TEXT NOT NULL REFERENCES knowledge_bases(id),
    title          TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id),
    origin     TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS kb_files (
    knowledge_base TEXT NOT NULL REFERENCES knowledge_bases(id),
    file_name      TEXT NOT NULL,
    file_type      TEXT NOT NULL,
    chunk_count    INTEGER NOT NULL,
    ingested_at    TEXT NOT NULL,
    PRIMARY KEY (knowledge_base, file_name)
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id);
CREATE INDEX IF NOT EXISTS idx_sessions_kb ON sessions(knowledge_base);
";

/// Conversation store backed by a SQLite database file.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to the database at `url` (e.g. `sqlite://data/chat.db`),
    /// creating the file and schema when missing.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::database)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StoreError::database)?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(StoreError::database)?;

        info!(url, "sqlite store ready");
        Ok(Self { pool })
    }

    /// Wraps an existing pool (tests).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(StoreError::database)?;
        Ok(Self { pool })
    }
}

fn parse_timestamp(value: &str) -> Result<Timestamp, StoreError> {
    Timestamp::parse_rfc3339(value).map_err(StoreError::database)
}

fn kb_record(row: &SqliteRow) -> Result<KnowledgeBaseRecord, StoreError> {
    Ok(KnowledgeBaseRecord {
        id: KnowledgeBaseId::new(row.get::<String, _>("id")).map_err(StoreError::database)?,
        description: row.get("description"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn session_record(row: &SqliteRow) -> Result<SessionRecord, StoreError> {
    Ok(SessionRecord {
        id: SessionId::from_str(&row.get::<String, _>("id")).map_err(StoreError::database)?,
        knowledge_base: KnowledgeBaseId::new(row.get::<String, _>("knowledge_base"))
            .map_err(StoreError::database)?,
        title: row.get("title"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn message_record(row: &SqliteRow) -> Result<StoredMessage, StoreError> {
    let origin_label: String = row.get("origin");
    let origin = MessageOrigin::parse(&origin_label)
        .ok_or_else(|| StoreError::Database(format!("unknown message origin: {origin_label}")))?;
    Ok(StoredMessage {
        id: MessageId::from_str(&row.get::<String, _>("id")).map_err(StoreError::database)?,
        session: SessionId::from_str(&row.get::<String, _>("session_id"))
            .map_err(StoreError::database)?,
        origin,
        content: row.get("content"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn file_record(row: &SqliteRow) -> Result<IngestedFileRecord, StoreError> {
    Ok(IngestedFileRecord {
        knowledge_base: KnowledgeBaseId::new(row.get::<String, _>("knowledge_base"))
            .map_err(StoreError::database)?,
        file_name: row.get("file_name"),
        file_type: row.get("file_type"),
        chunk_count: row.get::<i64, _>("chunk_count") as u32,
        ingested_at: parse_timestamp(&row.get::<String, _>("ingested_at"))?,
    })
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn create_knowledge_base(
        &self,
        id: &KnowledgeBaseId,
        description: Option<&str>,
    ) -> Result<KnowledgeBaseRecord, StoreError> {
        let now = Timestamp::now();
        let result = sqlx::query(
            "INSERT INTO knowledge_bases (id, description, created_at) VALUES (?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(description)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(KnowledgeBaseRecord {
                id: id.clone(),
                description: description.map(String::from),
                created_at: now,
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::already_exists("knowledge base", id.as_str()))
            }
            Err(e) => Err(StoreError::database(e)),
        }
    }

    async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, description, created_at FROM knowledge_bases ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        rows.iter().map(kb_record).collect()
    }

    async fn find_knowledge_base(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<Option<KnowledgeBaseRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, description, created_at FROM knowledge_bases WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;

        row.as_ref().map(kb_record).transpose()
    }

    async fn delete_knowledge_base(&self, id: &KnowledgeBaseId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        sqlx::query(
            "DELETE FROM messages WHERE session_id IN \
             (SELECT id FROM sessions WHERE knowledge_base = ?)",
        )
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;

        sqlx::query("DELETE FROM sessions WHERE knowledge_base = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

        sqlx::query("DELETE FROM kb_files WHERE knowledge_base = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

        let result = sqlx::query("DELETE FROM knowledge_bases WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("knowledge base", id.as_str()));
        }

        tx.commit().await.map_err(StoreError::database)
    }

    async fn knowledge_base_stats(
        &self,
        id: &KnowledgeBaseId,
    ) -> Result<KnowledgeBaseStats, StoreError> {
        let row = sqlx::query(
            "SELECT \
               (SELECT COUNT(*) FROM kb_files WHERE knowledge_base = ?1) AS file_count, \
               (SELECT COALESCE(SUM(chunk_count), 0) FROM kb_files \
                  WHERE knowledge_base = ?1) AS chunk_count, \
               (SELECT COUNT(*) FROM sessions WHERE knowledge_base = ?1) AS session_count",
        )
        .bind(id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::database)?;

        Ok(KnowledgeBaseStats {
            file_count: row.get::<i64, _>("file_count") as u32,
            chunk_count: row.get::<i64, _>("chunk_count") as u32,
            session_count: row.get::<i64, _>("session_count") as u32,
        })
    }

    async fn create_session(
        &self,
        knowledge_base: &KnowledgeBaseId,
        title: Option<&str>,
    ) -> Result<SessionRecord, StoreError> {
        let id = SessionId::new();
        let now = Timestamp::now();

        sqlx::query(
            "INSERT INTO sessions (id, knowledge_base, title, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(knowledge_base.as_str())
        .bind(title)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;

        Ok(SessionRecord {
            id,
            knowledge_base: knowledge_base.clone(),
            title: title.map(String::from),
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_session(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, knowledge_base, title, created_at, updated_at \
             FROM sessions WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;

        row.as_ref().map(session_record).transpose()
    }

    async fn sessions_for_knowledge_base(
        &self,
        knowledge_base: &KnowledgeBaseId,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, knowledge_base, title, created_at, updated_at \
             FROM sessions WHERE knowledge_base = ? ORDER BY updated_at DESC",
        )
        .bind(knowledge_base.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        rows.iter().map(session_record).collect()
    }

    async fn latest_session_for_knowledge_base(
        &self,
        knowledge_base: &KnowledgeBaseId,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, knowledge_base, title, created_at, updated_at \
             FROM sessions WHERE knowledge_base = ? ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(knowledge_base.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::database)?;

        row.as_ref().map(session_record).transpose()
    }

    async fn append_message(
        &self,
        session: &SessionId,
        origin: MessageOrigin,
        content: &str,
    ) -> Result<StoredMessage, StoreError> {
        let id = MessageId::new();
        let now = Timestamp::now();
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        let result = sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
            .bind(now.to_rfc3339())
            .bind(session.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("session", session.to_string()));
        }

        sqlx::query(
            "INSERT INTO messages (id, session_id, origin, content, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(session.to_string())
        .bind(origin.label())
        .bind(content)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database)?;

        tx.commit().await.map_err(StoreError::database)?;

        Ok(StoredMessage {
            id,
            session: *session,
            origin,
            content: content.to_string(),
            created_at: now,
        })
    }

    async fn append_exchange(
        &self,
        session: &SessionId,
        user_content: &str,
        assistant_content: &str,
    ) -> Result<(StoredMessage, StoredMessage), StoreError> {
        let now = Timestamp::now();
        let mut tx = self.pool.begin().await.map_err(StoreError::database)?;

        let result = sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
            .bind(now.to_rfc3339())
            .bind(session.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("session", session.to_string()));
        }

        let user = StoredMessage {
            id: MessageId::new(),
            session: *session,
            origin: MessageOrigin::User,
            content: user_content.to_string(),
            created_at: now,
        };
        let assistant = StoredMessage {
            id: MessageId::new(),
            session: *session,
            origin: MessageOrigin::Assistant,
            content: assistant_content.to_string(),
            created_at: now,
        };

        for message in [&user, &assistant] {
            sqlx::query(
                "INSERT INTO messages (id, session_id, origin, content, created_at) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(message.id.to_string())
            .bind(session.to_string())
            .bind(message.origin.label())
            .bind(&message.content)
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database)?;
        }

        tx.commit().await.map_err(StoreError::database)?;
        Ok((user, assistant))
    }

    async fn read_history(
        &self,
        session: &SessionId,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        // Newest `limit` rows, then flipped back into append order.
        let rows = sqlx::query(
            "SELECT id, session_id, origin, content, created_at \
             FROM messages WHERE session_id = ? ORDER BY rowid DESC LIMIT ?",
        )
        .bind(session.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        let mut messages: Vec<StoredMessage> = rows
            .iter()
            .map(message_record)
            .collect::<Result<_, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn record_ingested_file(
        &self,
        knowledge_base: &KnowledgeBaseId,
        file_name: &str,
        file_type: &str,
        chunk_count: u32,
    ) -> Result<IngestedFileRecord, StoreError> {
        let now = Timestamp::now();

        sqlx::query(
            "INSERT INTO kb_files (knowledge_base, file_name, file_type, chunk_count, \
             ingested_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (knowledge_base, file_name) \
             DO UPDATE SET file_type = excluded.file_type, \
                           chunk_count = excluded.chunk_count, \
                           ingested_at = excluded.ingested_at",
        )
        .bind(knowledge_base.as_str())
        .bind(file_name)
        .bind(file_type)
        .bind(i64::from(chunk_count))
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StoreError::database)?;

        Ok(IngestedFileRecord {
            knowledge_base: knowledge_base.clone(),
            file_name: file_name.to_string(),
            file_type: file_type.to_string(),
            chunk_count,
            ingested_at: now,
        })
    }

    async fn files_for_knowledge_base(
        &self,
        knowledge_base: &KnowledgeBaseId,
    ) -> Result<Vec<IngestedFileRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT knowledge_base, file_name, file_type, chunk_count, ingested_at \
             FROM kb_files WHERE knowledge_base = ? ORDER BY ingested_at DESC",
        )
        .bind(knowledge_base.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database)?;

        rows.iter().map(file_record).collect()
    }
}
