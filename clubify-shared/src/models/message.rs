/// Internal messages between users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{user::UserRole, user_columns, ClubSummary, Priority, UserSummary};

/// Which side of the conversation to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mailbox {
    Sent,
    #[default]
    Received,
}

impl Mailbox {
    /// `?type=sent` selects the sent box; anything else means received
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("sent") => Mailbox::Sent,
            _ => Mailbox::Received,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub sender: UserSummary,
    pub recipient: UserSummary,
    pub club: ClubSummary,
    pub subject: String,
    pub content: String,
    pub priority: Priority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub club_id: Uuid,
    pub subject: String,
    pub content: String,
    pub priority: Priority,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    subject: String,
    content: String,
    priority: Priority,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    club_id: Uuid,
    club_name: String,
    sender_id: Uuid,
    sender_name: String,
    sender_email: String,
    sender_role: UserRole,
    recipient_id: Uuid,
    recipient_name: String,
    recipient_email: String,
    recipient_role: UserRole,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender: UserSummary {
                id: row.sender_id,
                name: row.sender_name,
                email: row.sender_email,
                role: row.sender_role,
            },
            recipient: UserSummary {
                id: row.recipient_id,
                name: row.recipient_name,
                email: row.recipient_email,
                role: row.recipient_role,
            },
            club: ClubSummary {
                id: row.club_id,
                name: row.club_name,
            },
            subject: row.subject,
            content: row.content,
            priority: row.priority,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn message_select() -> String {
    format!(
        "SELECT m.id, m.subject, m.content, m.priority, m.is_read, m.read_at, \
                m.created_at, m.updated_at, c.id AS club_id, c.name AS club_name, {}, {} \
         FROM messages m \
         JOIN clubs c ON c.id = m.club_id \
         JOIN users s ON s.id = m.sender_id \
         JOIN users r ON r.id = m.recipient_id",
        user_columns("s", "sender"),
        user_columns("r", "recipient")
    )
}

impl Message {
    pub async fn create(pool: &PgPool, data: CreateMessage) -> Result<Self, sqlx::Error> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO messages (sender_id, recipient_id, club_id, subject, content, priority) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(data.sender_id)
        .bind(data.recipient_id)
        .bind(data.club_id)
        .bind(data.subject.trim())
        .bind(data.content)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{} WHERE m.id = $1", message_select());

        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Message::from))
    }

    /// Messages sent or received by `user_id`, newest first
    pub async fn list_for(
        pool: &PgPool,
        user_id: Uuid,
        mailbox: Mailbox,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let column = match mailbox {
            Mailbox::Sent => "m.sender_id",
            Mailbox::Received => "m.recipient_id",
        };

        let query = format!(
            "{} WHERE {column} = $1 ORDER BY m.created_at DESC",
            message_select()
        );

        let rows = sqlx::query_as::<_, MessageRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    /// Recipient of a message, or `None` if it does not exist
    pub async fn recipient_of(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT recipient_id FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Sets `is_read` and stamps `read_at`
    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE, read_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
