//! Course event endpoint handlers.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::response::{ok, Envelope};
use domain::models::{CourseEvent, QuoteRequest};
use domain::services::{calculate_quote, Quote, QuoteInput};
use persistence::repositories::EventRepository;

pub(crate) async fn load_published_event(
    state: &AppState,
    slug: &str,
) -> Result<CourseEvent, ApiError> {
    EventRepository::new(state.pool.clone())
        .find_by_slug(slug)
        .await?
        .map(CourseEvent::from)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

/// GET /api/v1/events
///
/// Published events, soonest first.
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Envelope<Vec<CourseEvent>>>, ApiError> {
    let events = EventRepository::new(state.pool.clone())
        .list_published()
        .await?
        .into_iter()
        .map(CourseEvent::from)
        .collect();
    Ok(ok(events))
}

/// GET /api/v1/events/:slug
pub async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Envelope<CourseEvent>>, ApiError> {
    Ok(ok(load_published_event(&state, &slug).await?))
}

/// POST /api/v1/events/:slug/quote
///
/// The same quote the registration wizard shows: base price plus accommodation.
pub async fn quote_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Envelope<Quote>>, ApiError> {
    let event = load_published_event(&state, &slug).await?;
    let input = QuoteInput::from(request);
    Ok(ok(calculate_quote(&event, &input, &state.rates)))
}
