/// Proposal endpoints
///
/// - `GET /api/proposals`: members see their own, officers see all
/// - `POST /api/proposals`: submit a proposal (any role)
/// - `PUT /api/proposals/:id/review`: append a review (lead, board)
///
/// A review decision of `approved` or `rejected` becomes the proposal's
/// status; `needs_revision` is recorded without changing it.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{not_blank, Gate, IdPath, Officers, ValidJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use clubify_shared::{
    auth::identity::AuthContext,
    models::{
        club::{Club, ClubRef},
        proposal::{CreateProposal, Proposal, ProposalCategory, ProposalScope, ReviewDecision},
        Priority,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposalRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "not_blank", message = "Title must not be blank")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "Description must be 1-5000 characters"),
        custom(function = "not_blank", message = "Description must not be blank")
    )]
    pub description: String,

    pub club: Option<ClubRef>,
    pub category: Option<ProposalCategory>,
    pub priority: Option<Priority>,

    #[validate(range(min = 0.0, message = "estimatedCost must not be negative"))]
    pub estimated_cost: Option<f64>,

    pub estimated_duration: Option<String>,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub benefits: Vec<String>,

    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    /// `approved`, `rejected` or `needs_revision`
    #[validate(required(message = "status is required"))]
    pub status: Option<ReviewDecision>,

    #[validate(length(max = 2000, message = "Comments must be at most 2000 characters"))]
    pub comments: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalListResponse {
    pub success: bool,
    pub proposals: Vec<Proposal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub success: bool,
    pub message: String,
    pub proposal: Proposal,
}

/// Drops blank entries from a client-supplied list
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub async fn list_proposals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProposalListResponse>> {
    let scope = ProposalScope::for_role(auth.role, auth.user_id);
    let proposals = Proposal::list(&state.db, scope).await?;

    Ok(Json(ProposalListResponse {
        success: true,
        proposals,
    }))
}

pub async fn create_proposal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidJson(req): ValidJson<CreateProposalRequest>,
) -> ApiResult<(StatusCode, Json<ProposalResponse>)> {
    let club_id = Club::resolve(&state.db, req.club.unwrap_or_default(), auth.user_id).await?;

    let proposal = Proposal::create(
        &state.db,
        CreateProposal {
            title: req.title.trim().to_string(),
            description: req.description,
            proposer_id: auth.user_id,
            club_id,
            category: req.category.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            estimated_cost: req.estimated_cost,
            estimated_duration: req.estimated_duration,
            requirements: clean_list(req.requirements),
            benefits: clean_list(req.benefits),
            risks: clean_list(req.risks),
        },
    )
    .await?;

    info!(proposal_id = %proposal.id, proposer = %auth.user_id, "Proposal submitted");

    Ok((
        StatusCode::CREATED,
        Json(ProposalResponse {
            success: true,
            message: "Proposal submitted successfully".to_string(),
            proposal,
        }),
    ))
}

pub async fn review_proposal(
    State(state): State<AppState>,
    Gate(auth, _): Gate<Officers>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<ReviewRequest>,
) -> ApiResult<Json<ProposalResponse>> {
    let decision = req
        .status
        .ok_or_else(|| ApiError::invalid_field("status", "status is required"))?;

    let proposal = Proposal::add_review(&state.db, id, auth.user_id, decision, req.comments)
        .await?
        .ok_or_else(|| ApiError::NotFound("Proposal not found".to_string()))?;

    info!(
        proposal_id = %id,
        reviewer = %auth.user_id,
        decision = ?decision,
        status = ?proposal.status,
        "Proposal reviewed"
    );

    Ok(Json(ProposalResponse {
        success: true,
        message: "Proposal reviewed successfully".to_string(),
        proposal,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_list_drops_blanks() {
        let items = vec!["  Room ".to_string(), "".to_string(), "   ".to_string(), "Budget".to_string()];
        assert_eq!(clean_list(items), vec!["Room", "Budget"]);
    }

    #[test]
    fn test_review_decision_parsing() {
        let req: ReviewRequest =
            serde_json::from_str(r#"{"status": "needs_revision", "comments": "More detail"}"#).unwrap();
        assert_eq!(req.status, Some(ReviewDecision::NeedsRevision));
        assert!(req.validate().is_ok());

        let missing: ReviewRequest = serde_json::from_str(r#"{"comments": "?"}"#).unwrap();
        assert!(missing.validate().is_err());

        let bogus: Result<ReviewRequest, _> = serde_json::from_str(r#"{"status": "implemented"}"#);
        assert!(bogus.is_err());
    }

    #[test]
    fn test_proposal_lists_default_empty() {
        let req: CreateProposalRequest =
            serde_json::from_str(r#"{"title": "Hackathon", "description": "Weekend event"}"#).unwrap();

        assert!(req.validate().is_ok());
        assert!(req.requirements.is_empty());
        assert_eq!(req.club.unwrap_or_default(), ClubRef::Default);
    }
}
