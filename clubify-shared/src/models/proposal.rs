/// Member proposals and their review trail
///
/// A proposal starts `pending`. Its status only changes when a reviewer
/// appends a review:
///
/// ```text
/// decision        resulting status
/// approved    →   approved
/// rejected    →   rejected
/// needs_revision  (unchanged)
/// ```
///
/// The review insert and the status update happen in one transaction, so a
/// proposal never shows a decision without the review that made it.
///
/// # Example
///
/// ```no_run
/// use clubify_shared::models::proposal::{Proposal, ReviewDecision};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, proposal_id: Uuid, reviewer: Uuid) -> Result<(), sqlx::Error> {
/// let reviewed = Proposal::add_review(
///     &pool,
///     proposal_id,
///     reviewer,
///     ReviewDecision::NeedsRevision,
///     Some("Please add a budget".to_string()),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{user::UserRole, user_columns, ClubSummary, Priority, UserSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "proposal_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProposalCategory {
    Event,
    Activity,
    Improvement,
    Funding,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "proposal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Implemented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_decision", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
    NeedsRevision,
}

impl ReviewDecision {
    /// Status the proposal moves to, if the decision is final
    pub fn resulting_status(&self) -> Option<ProposalStatus> {
        match self {
            ReviewDecision::Approved => Some(ProposalStatus::Approved),
            ReviewDecision::Rejected => Some(ProposalStatus::Rejected),
            ReviewDecision::NeedsRevision => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub reviewer: UserSummary,

    #[serde(rename = "status")]
    pub decision: ReviewDecision,

    pub comments: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub proposer: UserSummary,
    pub club: ClubSummary,
    pub category: ProposalCategory,
    pub status: ProposalStatus,
    pub priority: Priority,
    pub estimated_cost: Option<f64>,
    pub estimated_duration: Option<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub risks: Vec<String>,
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProposal {
    pub title: String,
    pub description: String,
    pub proposer_id: Uuid,
    pub club_id: Uuid,
    pub category: ProposalCategory,
    pub priority: Priority,
    pub estimated_cost: Option<f64>,
    pub estimated_duration: Option<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub risks: Vec<String>,
}

/// Which proposals a user may list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalScope {
    ProposedBy(Uuid),
    All,
}

impl ProposalScope {
    /// Members see their own proposals; officers see everything
    pub fn for_role(role: UserRole, user_id: Uuid) -> Self {
        if role.is_officer() {
            ProposalScope::All
        } else {
            ProposalScope::ProposedBy(user_id)
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: Uuid,
    title: String,
    description: String,
    category: ProposalCategory,
    status: ProposalStatus,
    priority: Priority,
    estimated_cost: Option<f64>,
    estimated_duration: Option<String>,
    requirements: Vec<String>,
    benefits: Vec<String>,
    risks: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    club_id: Uuid,
    club_name: String,
    proposer_id: Uuid,
    proposer_name: String,
    proposer_email: String,
    proposer_role: UserRole,
}

impl ProposalRow {
    fn into_proposal(self, reviews: Vec<Review>) -> Proposal {
        Proposal {
            id: self.id,
            title: self.title,
            description: self.description,
            proposer: UserSummary {
                id: self.proposer_id,
                name: self.proposer_name,
                email: self.proposer_email,
                role: self.proposer_role,
            },
            club: ClubSummary {
                id: self.club_id,
                name: self.club_name,
            },
            category: self.category,
            status: self.status,
            priority: self.priority,
            estimated_cost: self.estimated_cost,
            estimated_duration: self.estimated_duration,
            requirements: self.requirements,
            benefits: self.benefits,
            risks: self.risks,
            reviews,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    proposal_id: Uuid,
    decision: ReviewDecision,
    comments: Option<String>,
    reviewed_at: DateTime<Utc>,
    reviewer_id: Uuid,
    reviewer_name: String,
    reviewer_email: String,
    reviewer_role: UserRole,
}

fn proposal_select() -> String {
    format!(
        "SELECT p.id, p.title, p.description, p.category, p.status, p.priority, \
                p.estimated_cost, p.estimated_duration, p.requirements, p.benefits, p.risks, \
                p.created_at, p.updated_at, c.id AS club_id, c.name AS club_name, {} \
         FROM proposals p \
         JOIN clubs c ON c.id = p.club_id \
         JOIN users u ON u.id = p.proposer_id",
        user_columns("u", "proposer")
    )
}

impl Proposal {
    /// Submits a proposal with status `pending`
    pub async fn create(pool: &PgPool, data: CreateProposal) -> Result<Self, sqlx::Error> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO proposals (title, description, proposer_id, club_id, category, priority, \
                                    estimated_cost, estimated_duration, requirements, benefits, risks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
        )
        .bind(data.title.trim())
        .bind(data.description)
        .bind(data.proposer_id)
        .bind(data.club_id)
        .bind(data.category)
        .bind(data.priority)
        .bind(data.estimated_cost)
        .bind(data.estimated_duration)
        .bind(data.requirements)
        .bind(data.benefits)
        .bind(data.risks)
        .fetch_one(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{} WHERE p.id = $1", proposal_select());

        let Some(row) = sqlx::query_as::<_, ProposalRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let mut reviews = Self::reviews_of(pool, &[id]).await?;
        Ok(Some(row.into_proposal(reviews.remove(&id).unwrap_or_default())))
    }

    /// Proposals visible in `scope`, newest first
    pub async fn list(pool: &PgPool, scope: ProposalScope) -> Result<Vec<Self>, sqlx::Error> {
        let proposer = match scope {
            ProposalScope::ProposedBy(id) => Some(id),
            ProposalScope::All => None,
        };

        let query = format!(
            "{} WHERE ($1::uuid IS NULL OR p.proposer_id = $1) ORDER BY p.created_at DESC",
            proposal_select()
        );

        let rows = sqlx::query_as::<_, ProposalRow>(&query)
            .bind(proposer)
            .fetch_all(pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut reviews = Self::reviews_of(pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let list = reviews.remove(&row.id).unwrap_or_default();
                row.into_proposal(list)
            })
            .collect())
    }

    async fn reviews_of(
        pool: &PgPool,
        proposal_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Review>>, sqlx::Error> {
        if proposal_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT r.proposal_id, r.decision, r.comments, r.reviewed_at, {} \
             FROM proposal_reviews r JOIN users u ON u.id = r.reviewer_id \
             WHERE r.proposal_id = ANY($1) \
             ORDER BY r.reviewed_at ASC",
            user_columns("u", "reviewer")
        );

        let rows = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(proposal_ids)
            .fetch_all(pool)
            .await?;

        let mut grouped: HashMap<Uuid, Vec<Review>> = HashMap::new();
        for row in rows {
            grouped.entry(row.proposal_id).or_default().push(Review {
                reviewer: UserSummary {
                    id: row.reviewer_id,
                    name: row.reviewer_name,
                    email: row.reviewer_email,
                    role: row.reviewer_role,
                },
                decision: row.decision,
                comments: row.comments,
                reviewed_at: row.reviewed_at,
            });
        }

        Ok(grouped)
    }

    /// Appends a review and applies its decision
    ///
    /// Returns `None` if the proposal does not exist.
    pub async fn add_review(
        pool: &PgPool,
        proposal_id: Uuid,
        reviewer_id: Uuid,
        decision: ReviewDecision,
        comments: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM proposals WHERE id = $1 FOR UPDATE")
                .bind(proposal_id)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO proposal_reviews (proposal_id, reviewer_id, decision, comments) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(proposal_id)
        .bind(reviewer_id)
        .bind(decision)
        .bind(comments)
        .execute(&mut *tx)
        .await?;

        let new_status = decision.resulting_status();
        sqlx::query(
            "UPDATE proposals SET status = COALESCE($2, status), updated_at = NOW() WHERE id = $1",
        )
        .bind(proposal_id)
        .bind(new_status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            proposal_id = %proposal_id,
            reviewer_id = %reviewer_id,
            decision = ?decision,
            "Proposal reviewed"
        );

        Self::find_by_id(pool, proposal_id).await
    }
}
