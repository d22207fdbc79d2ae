/// Event model, attendee registration and listing filters
///
/// # Schema
///
/// ```sql
/// CREATE TABLE events (
///     id UUID PRIMARY KEY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     location VARCHAR(255),
///     club_id UUID NOT NULL REFERENCES clubs(id),
///     organizer_id UUID NOT NULL REFERENCES users(id),
///     start_date TIMESTAMPTZ NOT NULL,
///     end_date TIMESTAMPTZ,
///     category event_category NOT NULL DEFAULT 'other',
///     status event_status NOT NULL DEFAULT 'published',
///     max_attendees INTEGER,
///     ...
/// );
///
/// CREATE TABLE event_attendees (
///     event_id UUID REFERENCES events(id),
///     user_id UUID REFERENCES users(id),
///     registered_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (event_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{user::UserRole, user_columns, ClubSummary, UserSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Meeting,
    Workshop,
    Social,
    Sports,
    Academic,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    #[default]
    Published,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub user: UserSummary,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub club: ClubSummary,
    pub organizer: UserSummary,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: EventCategory,
    pub status: EventStatus,
    pub max_attendees: Option<i32>,
    pub attendees: Vec<Attendee>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub club_id: Uuid,
    pub organizer_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: EventCategory,
    pub status: EventStatus,
    pub max_attendees: Option<i32>,
}

/// Listing filter from the query string
#[derive(Debug, Clone, Copy, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,

    /// Keep only events starting now or later
    pub upcoming: bool,
}

/// Result of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    AlreadyRegistered,
    Full,
    EventNotFound,
}

/// An event may not end before it starts
pub fn schedule_is_valid(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
    end.map_or(true, |end| end >= start)
}

/// Whether one more attendee fits
pub fn has_capacity(max_attendees: Option<i32>, registered: i64) -> bool {
    max_attendees.map_or(true, |max| registered < i64::from(max))
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    location: Option<String>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    category: EventCategory,
    status: EventStatus,
    max_attendees: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    club_id: Uuid,
    club_name: String,
    organizer_id: Uuid,
    organizer_name: String,
    organizer_email: String,
    organizer_role: UserRole,
}

impl EventRow {
    fn into_event(self, attendees: Vec<Attendee>) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            location: self.location,
            club: ClubSummary {
                id: self.club_id,
                name: self.club_name,
            },
            organizer: UserSummary {
                id: self.organizer_id,
                name: self.organizer_name,
                email: self.organizer_email,
                role: self.organizer_role,
            },
            start_date: self.start_date,
            end_date: self.end_date,
            category: self.category,
            status: self.status,
            max_attendees: self.max_attendees,
            attendees,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttendeeRow {
    event_id: Uuid,
    registered_at: DateTime<Utc>,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    user_role: UserRole,
}

fn event_select() -> String {
    format!(
        "SELECT e.id, e.title, e.description, e.location, e.start_date, e.end_date, \
                e.category, e.status, e.max_attendees, e.created_at, e.updated_at, \
                c.id AS club_id, c.name AS club_name, {} \
         FROM events e \
         JOIN clubs c ON c.id = e.club_id \
         JOIN users o ON o.id = e.organizer_id",
        user_columns("o", "organizer")
    )
}

impl Event {
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, sqlx::Error> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO events (title, description, location, club_id, organizer_id, \
                                 start_date, end_date, category, status, max_attendees) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(data.title.trim())
        .bind(data.description)
        .bind(data.location)
        .bind(data.club_id)
        .bind(data.organizer_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.category)
        .bind(data.status)
        .bind(data.max_attendees)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{} WHERE e.id = $1", event_select());

        let Some(row) = sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let mut attendees = Self::attendees_of(pool, &[id]).await?;
        Ok(Some(row.into_event(attendees.remove(&id).unwrap_or_default())))
    }

    /// Events matching `filter`, earliest start first
    pub async fn list(pool: &PgPool, filter: EventFilter) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "{} WHERE ($1::event_status IS NULL OR e.status = $1) \
               AND (NOT $2 OR e.start_date >= NOW()) \
             ORDER BY e.start_date ASC",
            event_select()
        );

        let rows = sqlx::query_as::<_, EventRow>(&query)
            .bind(filter.status)
            .bind(filter.upcoming)
            .fetch_all(pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut attendees = Self::attendees_of(pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let list = attendees.remove(&row.id).unwrap_or_default();
                row.into_event(list)
            })
            .collect())
    }

    async fn attendees_of(
        pool: &PgPool,
        event_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Attendee>>, sqlx::Error> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT r.event_id, r.registered_at, {} \
             FROM event_attendees r JOIN users u ON u.id = r.user_id \
             WHERE r.event_id = ANY($1) \
             ORDER BY r.registered_at ASC",
            user_columns("u", "user")
        );

        let rows = sqlx::query_as::<_, AttendeeRow>(&query)
            .bind(event_ids)
            .fetch_all(pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<Attendee>> = HashMap::new();
        for row in rows {
            grouped.entry(row.event_id).or_default().push(Attendee {
                user: UserSummary {
                    id: row.user_id,
                    name: row.user_name,
                    email: row.user_email,
                    role: row.user_role,
                },
                registered_at: row.registered_at,
            });
        }

        Ok(grouped)
    }

    /// Registers a user for an event
    ///
    /// The event row is locked while the attendee count is checked, so two
    /// concurrent registrations cannot both take the last seat.
    pub async fn register_attendee(
        pool: &PgPool,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Registration, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let max_attendees: Option<Option<i32>> =
            sqlx::query_scalar("SELECT max_attendees FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(max_attendees) = max_attendees else {
            return Ok(Registration::EventNotFound);
        };

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM event_attendees WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if already {
            return Ok(Registration::AlreadyRegistered);
        }

        let registered: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM event_attendees WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;

        if !has_capacity(max_attendees, registered) {
            debug!(event_id = %event_id, registered, "Event is full");
            return Ok(Registration::Full);
        }

        sqlx::query("INSERT INTO event_attendees (event_id, user_id) VALUES ($1, $2)")
            .bind(event_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Registration::Registered)
    }
}
