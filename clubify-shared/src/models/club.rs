/// Club model, memberships and the default-club resolver
///
/// Every task, event, product, sale, proposal and message belongs to a club.
/// Clients that do not care about clubs send the sentinel `"default-club"`
/// (or nothing at all) and the record is attached to the single default
/// club, which is created on first use.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE clubs (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     category club_category NOT NULL DEFAULT 'other',
///     admin_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_default BOOLEAN NOT NULL DEFAULT FALSE,
///     is_public BOOLEAN NOT NULL DEFAULT TRUE,
///     allow_member_invites BOOLEAN NOT NULL DEFAULT TRUE,
///     require_approval BOOLEAN NOT NULL DEFAULT FALSE,
///     ...
/// );
/// CREATE UNIQUE INDEX idx_clubs_single_default ON clubs (is_default) WHERE is_default;
///
/// CREATE TABLE club_members (
///     club_id UUID REFERENCES clubs(id),
///     user_id UUID REFERENCES users(id),
///     role club_member_role NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (club_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use clubify_shared::models::club::{Club, ClubRef};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, requester: Uuid) -> Result<(), sqlx::Error> {
/// // "default-club" and a missing club both resolve to the default club
/// let club_id = Club::resolve(&pool, ClubRef::Default, requester).await?;
/// let again = Club::resolve(&pool, ClubRef::Default, requester).await?;
/// assert_eq!(club_id, again);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{user::UserRole, user_columns, UserSummary};

/// Value clients send in place of a club id
pub const DEFAULT_CLUB_SENTINEL: &str = "default-club";

pub const DEFAULT_CLUB_NAME: &str = "Default Club";

pub const DEFAULT_CLUB_DESCRIPTION: &str = "The main club for all activities";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "club_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClubCategory {
    Sports,
    Academic,
    Cultural,
    Technology,
    Social,
    #[default]
    Other,
}

/// Role of a user inside one club (distinct from [`UserRole`])
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "club_member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClubMemberRole {
    #[default]
    Member,
    Moderator,
    Admin,
}

/// Club reference as sent by clients
///
/// Deserializes from a string: the sentinel `"default-club"` (or an empty
/// string) means [`ClubRef::Default`], anything else must be a UUID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ClubRef {
    #[default]
    Default,
    Id(Uuid),
}

impl TryFrom<String> for ClubRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim();

        if value.is_empty() || value == DEFAULT_CLUB_SENTINEL {
            return Ok(ClubRef::Default);
        }

        Uuid::parse_str(value)
            .map(ClubRef::Id)
            .map_err(|_| format!("invalid club reference '{value}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSettings {
    pub is_public: bool,
    pub allow_member_invites: bool,
    pub require_approval: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubMember {
    pub user: UserSummary,
    pub role: ClubMemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Club with its admin and members populated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: ClubCategory,

    /// `None` for a default club created before any officer touched it
    pub admin: Option<UserSummary>,

    pub members: Vec<ClubMember>,
    pub is_active: bool,
    pub is_default: bool,
    pub settings: ClubSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a club
#[derive(Debug, Clone)]
pub struct CreateClub {
    pub name: String,
    pub description: String,
    pub category: ClubCategory,

    /// Becomes both the club admin and its first member
    pub admin_id: Uuid,
}

#[derive(sqlx::FromRow)]
struct ClubRow {
    id: Uuid,
    name: String,
    description: String,
    category: ClubCategory,
    is_active: bool,
    is_default: bool,
    is_public: bool,
    allow_member_invites: bool,
    require_approval: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    admin_id: Option<Uuid>,
    admin_name: Option<String>,
    admin_email: Option<String>,
    admin_role: Option<UserRole>,
}

impl ClubRow {
    fn into_club(self, members: Vec<ClubMember>) -> Club {
        let admin = match (self.admin_id, self.admin_name, self.admin_email, self.admin_role) {
            (Some(id), Some(name), Some(email), Some(role)) => Some(UserSummary {
                id,
                name,
                email,
                role,
            }),
            _ => None,
        };

        Club {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            admin,
            members,
            is_active: self.is_active,
            is_default: self.is_default,
            settings: ClubSettings {
                is_public: self.is_public,
                allow_member_invites: self.allow_member_invites,
                require_approval: self.require_approval,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    club_id: Uuid,
    member_role: ClubMemberRole,
    joined_at: DateTime<Utc>,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    user_role: UserRole,
}

impl From<MemberRow> for ClubMember {
    fn from(row: MemberRow) -> Self {
        ClubMember {
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                role: row.user_role,
            },
            role: row.member_role,
            joined_at: row.joined_at,
        }
    }
}

fn club_select() -> String {
    format!(
        "SELECT c.id, c.name, c.description, c.category, c.is_active, c.is_default, \
                c.is_public, c.allow_member_invites, c.require_approval, \
                c.created_at, c.updated_at, {} \
         FROM clubs c LEFT JOIN users a ON a.id = c.admin_id",
        user_columns("a", "admin")
    )
}

impl Club {
    /// Creates a club with the caller as admin and first member
    pub async fn create(pool: &PgPool, data: CreateClub) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO clubs (name, description, category, admin_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.category)
        .bind(data.admin_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO club_members (club_id, user_id, role) VALUES ($1, $2, 'admin')")
            .bind(id)
            .bind(data.admin_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{} WHERE c.id = $1", club_select());

        let Some(row) = sqlx::query_as::<_, ClubRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let mut members = Self::members_of(pool, &[id]).await?;
        Ok(Some(row.into_club(members.remove(&id).unwrap_or_default())))
    }

    /// Active clubs ordered by name, each with its members
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("{} WHERE c.is_active ORDER BY c.name ASC", club_select());

        let rows = sqlx::query_as::<_, ClubRow>(&query)
            .fetch_all(pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut members = Self::members_of(pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let club_members = members.remove(&row.id).unwrap_or_default();
                row.into_club(club_members)
            })
            .collect())
    }

    async fn members_of(
        pool: &PgPool,
        club_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<ClubMember>>, sqlx::Error> {
        if club_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT m.club_id, m.role AS member_role, m.joined_at, {} \
             FROM club_members m JOIN users u ON u.id = m.user_id \
             WHERE m.club_id = ANY($1) \
             ORDER BY m.joined_at ASC",
            user_columns("u", "user")
        );

        let rows = sqlx::query_as::<_, MemberRow>(&query)
            .bind(club_ids)
            .fetch_all(pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<ClubMember>> = HashMap::new();
        for row in rows {
            grouped.entry(row.club_id).or_default().push(row.into());
        }

        Ok(grouped)
    }

    /// Adds a user to a club
    ///
    /// Returns `false` if the user already was a member; the existing
    /// membership is left untouched.
    pub async fn add_member(
        pool: &PgPool,
        club_id: Uuid,
        user_id: Uuid,
        role: ClubMemberRole,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO club_members (club_id, user_id, role) VALUES ($1, $2, $3) \
             ON CONFLICT (club_id, user_id) DO NOTHING",
        )
        .bind(club_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the default club's id, creating the club if needed
    ///
    /// A single upsert against the partial unique index on `is_default`, so
    /// concurrent callers always agree on one club. `admin` is recorded only
    /// when the club has no admin yet.
    pub async fn ensure_default(pool: &PgPool, admin: Option<Uuid>) -> Result<Uuid, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO clubs (name, description, category, admin_id, is_default) \
             VALUES ($1, $2, 'other', $3, TRUE) \
             ON CONFLICT (is_default) WHERE is_default \
             DO UPDATE SET admin_id = COALESCE(clubs.admin_id, EXCLUDED.admin_id) \
             RETURNING id",
        )
        .bind(DEFAULT_CLUB_NAME)
        .bind(DEFAULT_CLUB_DESCRIPTION)
        .bind(admin)
        .fetch_one(pool)
        .await
    }

    /// Id of the default club, if it has been created
    pub async fn default_id(pool: &PgPool) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM clubs WHERE is_default")
            .fetch_optional(pool)
            .await
    }

    /// Turns a client club reference into a concrete club id
    ///
    /// An explicit id is passed through; a missing club is reported by the
    /// foreign key when the referencing record is inserted.
    pub async fn resolve(
        pool: &PgPool,
        club: ClubRef,
        requester: Uuid,
    ) -> Result<Uuid, sqlx::Error> {
        match club {
            ClubRef::Id(id) => Ok(id),
            ClubRef::Default => Self::ensure_default(pool, Some(requester)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default)]
        club: Option<ClubRef>,
    }

    #[test]
    fn test_club_ref_sentinel() {
        let body: Body = serde_json::from_str(r#"{"club": "default-club"}"#).unwrap();
        assert_eq!(body.club, Some(ClubRef::Default));
    }

    #[test]
    fn test_club_ref_missing_or_null() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.club.unwrap_or_default(), ClubRef::Default);

        let body: Body = serde_json::from_str(r#"{"club": null}"#).unwrap();
        assert_eq!(body.club.unwrap_or_default(), ClubRef::Default);
    }

    #[test]
    fn test_club_ref_uuid() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"club": "{id}"}}"#);
        let body: Body = serde_json::from_str(&json).unwrap();
        assert_eq!(body.club, Some(ClubRef::Id(id)));
    }

    #[test]
    fn test_club_ref_rejects_garbage() {
        let result: Result<Body, _> = serde_json::from_str(r#"{"club": "chess-club"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_row_without_admin() {
        let row = ClubRow {
            id: Uuid::new_v4(),
            name: DEFAULT_CLUB_NAME.to_string(),
            description: DEFAULT_CLUB_DESCRIPTION.to_string(),
            category: ClubCategory::Other,
            is_active: true,
            is_default: true,
            is_public: true,
            allow_member_invites: true,
            require_approval: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            admin_id: None,
            admin_name: None,
            admin_email: None,
            admin_role: None,
        };

        let club = row.into_club(Vec::new());
        assert!(club.admin.is_none());

        let json = serde_json::to_value(&club).unwrap();
        assert!(json["admin"].is_null());
        assert_eq!(json["settings"]["isPublic"], true);
        assert_eq!(json["category"], "other");
        assert_eq!(json["isDefault"], true);
    }
}
