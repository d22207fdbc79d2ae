/// Event endpoints
///
/// - `GET /api/events?status=&upcoming=true`: by start date
/// - `POST /api/events`: create with the caller as organizer (lead, board)
/// - `POST /api/events/:id/attend`: register the caller

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::extract::{not_blank, Gate, IdPath, Officers, QueryParams, ValidJson},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use clubify_shared::{
    auth::identity::AuthContext,
    models::{
        club::{Club, ClubRef},
        event::{
            schedule_is_valid, CreateEvent, Event, EventCategory, EventFilter, EventStatus,
            Registration,
        },
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub status: Option<EventStatus>,

    /// Only the literal `true` enables the filter
    pub upcoming: Option<String>,
}

impl EventQuery {
    pub fn filter(&self) -> EventFilter {
        EventFilter {
            status: self.status,
            upcoming: self.upcoming.as_deref() == Some("true"),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 200, message = "Title must be 1-200 characters"),
        custom(function = "not_blank", message = "Title must not be blank")
    )]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    pub club: Option<ClubRef>,

    #[validate(required(message = "startDate is required"))]
    pub start_date: Option<DateTime<Utc>>,

    pub end_date: Option<DateTime<Utc>>,
    pub category: Option<EventCategory>,
    pub status: Option<EventStatus>,

    #[validate(range(min = 1, message = "maxAttendees must be at least 1"))]
    pub max_attendees: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventListResponse {
    pub success: bool,
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub success: bool,
    pub message: String,
    pub event: Event,
}

pub async fn list_events(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<EventQuery>,
) -> ApiResult<Json<EventListResponse>> {
    let events = Event::list(&state.db, query.filter()).await?;

    Ok(Json(EventListResponse {
        success: true,
        events,
    }))
}

pub async fn create_event(
    State(state): State<AppState>,
    Gate(auth, _): Gate<Officers>,
    ValidJson(req): ValidJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<EventResponse>)> {
    let start_date = req
        .start_date
        .ok_or_else(|| ApiError::invalid_field("startDate", "startDate is required"))?;

    if !schedule_is_valid(start_date, req.end_date) {
        return Err(ApiError::invalid_field(
            "endDate",
            "End date must not be before the start date",
        ));
    }

    let club_id = Club::resolve(&state.db, req.club.unwrap_or_default(), auth.user_id).await?;

    let event = Event::create(
        &state.db,
        CreateEvent {
            title: req.title.trim().to_string(),
            description: req.description,
            location: req.location,
            club_id,
            organizer_id: auth.user_id,
            start_date,
            end_date: req.end_date,
            category: req.category.unwrap_or_default(),
            status: req.status.unwrap_or_default(),
            max_attendees: req.max_attendees,
        },
    )
    .await?;

    info!(event_id = %event.id, organizer = %auth.user_id, club_id = %club_id, "Event created");

    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            success: true,
            message: "Event created successfully".to_string(),
            event,
        }),
    ))
}

/// # Errors
///
/// - `404`: no such event
/// - `409`: the event has reached `maxAttendees`
pub async fn attend_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    IdPath(id): IdPath,
) -> ApiResult<Json<EventResponse>> {
    let not_found = || ApiError::NotFound("Event not found".to_string());

    let message = match Event::register_attendee(&state.db, id, auth.user_id).await? {
        Registration::Registered => {
            info!(event_id = %id, user_id = %auth.user_id, "Registered for event");
            "Registered for event successfully"
        }
        Registration::AlreadyRegistered => "Already registered for this event",
        Registration::Full => return Err(ApiError::Conflict("Event is full".to_string())),
        Registration::EventNotFound => return Err(not_found()),
    };

    let event = Event::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;

    Ok(Json(EventResponse {
        success: true,
        message: message.to_string(),
        event,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upcoming_only_for_literal_true() {
        let query = EventQuery {
            status: None,
            upcoming: Some("true".to_string()),
        };
        assert!(query.filter().upcoming);

        let query = EventQuery {
            status: Some(EventStatus::Draft),
            upcoming: Some("yes".to_string()),
        };
        let filter = query.filter();
        assert!(!filter.upcoming);
        assert_eq!(filter.status, Some(EventStatus::Draft));

        assert!(!EventQuery::default().filter().upcoming);
    }

    #[test]
    fn test_max_attendees_must_be_positive() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"title": "Meetup", "startDate": "2030-01-01T18:00:00Z", "maxAttendees": 0}"#,
        )
        .unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_event_parses_dates() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"title": "Meetup", "startDate": "2030-01-01T18:00:00Z", "endDate": "2030-01-01T20:00:00Z", "club": "default-club"}"#,
        )
        .unwrap();

        assert!(req.validate().is_ok());
        assert_eq!(req.club, Some(ClubRef::Default));
        assert!(schedule_is_valid(req.start_date.unwrap(), req.end_date));
    }
}
