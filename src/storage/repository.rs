use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{prelude::*, DatabaseTransaction, QueryOrder, Set, TransactionTrait};
use uuid::Uuid;

use crate::models::internal::{AppendAck, ChatSummary, Conversation, Part, Role, Turn, UserChats};
use crate::storage::entities::{chat_turns, chats, user_chat_entries, user_chats};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DbError(#[from] sea_orm::DbErr),
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================
// TRAIT DEFINITIONS
// ============================================

/// Persisted conversations. Every operation is scoped by owner: a
/// conversation owned by someone else is indistinguishable from one that
/// does not exist.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates a conversation whose history is a single user turn.
    async fn create(
        &self,
        owner: &str,
        initial_text: &str,
    ) -> Result<Conversation, RepositoryError>;

    async fn get(&self, id: &str, owner: &str) -> Result<Option<Conversation>, RepositoryError>;

    /// Appends `turns` to the end of the history as one batch.
    ///
    /// Returns [`RepositoryError::NotFound`] and writes nothing when no
    /// conversation matches `(id, owner)`.
    async fn append_turns(
        &self,
        id: &str,
        owner: &str,
        turns: Vec<Turn>,
    ) -> Result<AppendAck, RepositoryError>;
}

/// Per-user list of conversation summaries.
#[async_trait]
pub trait UserIndex: Send + Sync {
    /// Creates the owner's index entry if missing and pushes `summary`
    /// onto it, atomically.
    async fn ensure_entry(&self, owner: &str, summary: ChatSummary) -> Result<(), RepositoryError>;

    async fn list_entries(&self, owner: &str) -> Result<Vec<UserChats>, RepositoryError>;
}

// ============================================
// IMPLEMENTATION STRUCT
// ============================================
pub struct SeaOrmChatRepository {
    db: DatabaseConnection,
}

impl SeaOrmChatRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_turns(
        txn: &DatabaseTransaction,
        chat_id: &str,
        turns: &[Turn],
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut rows = Vec::with_capacity(turns.len());
        for turn in turns {
            let parts = serde_json::to_value(&turn.parts)
                .map_err(|e| RepositoryError::InvalidInput(e.to_string()))?;
            rows.push(chat_turns::ActiveModel {
                chat_id: Set(chat_id.to_owned()),
                role: Set(turn.role.as_str().to_owned()),
                parts: Set(parts),
                img: Set(turn.img.clone()),
                created_at: Set(now),
                ..Default::default()
            });
        }

        chat_turns::Entity::insert_many(rows)
            .exec_without_returning(txn)
            .await?;
        Ok(())
    }
}

// ============================================
// TRAIT IMPLEMENTATIONS
// ============================================
#[async_trait]
impl ConversationStore for SeaOrmChatRepository {
    async fn create(
        &self,
        owner: &str,
        initial_text: &str,
    ) -> Result<Conversation, RepositoryError> {
        let first = Turn::user(initial_text);
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let txn = self.db.begin().await?;
        chats::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(owner.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        Self::insert_turns(&txn, &id, std::slice::from_ref(&first), now).await?;
        txn.commit().await?;

        tracing::info!(chat_id = %id, "Created conversation");

        Ok(Conversation {
            id,
            user_id: owner.to_owned(),
            history: vec![first],
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, id: &str, owner: &str) -> Result<Option<Conversation>, RepositoryError> {
        let Some(chat) = chats::Entity::find_by_id(id.to_owned())
            .filter(chats::Column::UserId.eq(owner))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let rows = chat_turns::Entity::find()
            .filter(chat_turns::Column::ChatId.eq(id))
            .order_by_asc(chat_turns::Column::Seq)
            .all(&self.db)
            .await?;

        let history = rows
            .into_iter()
            .map(Turn::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Conversation {
            id: chat.id,
            user_id: chat.user_id,
            history,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }))
    }

    async fn append_turns(
        &self,
        id: &str,
        owner: &str,
        turns: Vec<Turn>,
    ) -> Result<AppendAck, RepositoryError> {
        if turns.is_empty() {
            return Err(RepositoryError::InvalidInput("no turns to append".to_string()));
        }
        for turn in &turns {
            turn.check().map_err(RepositoryError::InvalidInput)?;
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        // The ownership match doubles as the first write of the transaction,
        // so the write lock is held before any turn is inserted.
        let matched = chats::Entity::update_many()
            .col_expr(chats::Column::UpdatedAt, Expr::value(now))
            .filter(chats::Column::Id.eq(id))
            .filter(chats::Column::UserId.eq(owner))
            .exec(&txn)
            .await?;

        if matched.rows_affected == 0 {
            txn.rollback().await?;
            tracing::debug!(chat_id = %id, "Append matched no conversation");
            return Err(RepositoryError::NotFound(format!("chat {}", id)));
        }

        Self::insert_turns(&txn, id, &turns, now).await?;
        txn.commit().await?;

        tracing::debug!(chat_id = %id, turns = turns.len(), "Appended turns");
        Ok(AppendAck::applied())
    }
}

#[async_trait]
impl UserIndex for SeaOrmChatRepository {
    async fn ensure_entry(&self, owner: &str, summary: ChatSummary) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        // Insert-if-absent and touch in one go; the unique key on user_id
        // makes concurrent first-time callers converge on one row.
        user_chats::Entity::insert(user_chats::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(owner.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(user_chats::Column::UserId)
                .update_column(user_chats::Column::UpdatedAt)
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        let entry = user_chats::Entity::find()
            .filter(user_chats::Column::UserId.eq(owner))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                RepositoryError::Corrupt(format!("index entry for {} vanished", owner))
            })?;

        let owned = chats::Entity::find_by_id(summary.id.clone())
            .filter(chats::Column::UserId.eq(owner))
            .count(&txn)
            .await?;
        if owned == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::InvalidInput(format!(
                "chat {} is not owned by {}",
                summary.id, owner
            )));
        }

        user_chat_entries::ActiveModel {
            user_chats_id: Set(entry.id),
            chat_id: Set(summary.id),
            title: Set(summary.title),
            created_at: Set(summary.created_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(())
    }

    async fn list_entries(&self, owner: &str) -> Result<Vec<UserChats>, RepositoryError> {
        let entries = user_chats::Entity::find()
            .filter(user_chats::Column::UserId.eq(owner))
            .order_by_asc(user_chats::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(entries.len());
        for entry in entries {
            let chats = user_chat_entries::Entity::find()
                .filter(user_chat_entries::Column::UserChatsId.eq(entry.id.clone()))
                .order_by_asc(user_chat_entries::Column::Seq)
                .all(&self.db)
                .await?
                .into_iter()
                .map(ChatSummary::from)
                .collect();

            result.push(UserChats {
                id: entry.id,
                user_id: entry.user_id,
                chats,
                created_at: entry.created_at,
                updated_at: entry.updated_at,
            });
        }

        Ok(result)
    }
}

// ============================================
// Conversions
// ============================================

impl TryFrom<chat_turns::Model> for Turn {
    type Error = RepositoryError;

    fn try_from(model: chat_turns::Model) -> Result<Self, Self::Error> {
        let role: Role = model
            .role
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("turn {}: {}", model.seq, e)))?;
        let parts: Vec<Part> = serde_json::from_value(model.parts)
            .map_err(|e| RepositoryError::Corrupt(format!("turn {}: {}", model.seq, e)))?;

        Ok(Self {
            role,
            parts,
            img: model.img,
        })
    }
}

impl From<user_chat_entries::Model> for ChatSummary {
    fn from(model: user_chat_entries::Model) -> Self {
        Self {
            id: model.chat_id,
            title: model.title,
            created_at: model.created_at,
        }
    }
}
