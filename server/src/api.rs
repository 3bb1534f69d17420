//! JSON endpoints over the listing and conversation stores.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use haggle_common::conversation::{ConversationId, ConversationRecord};
use haggle_common::listing::{Listing, ListingId, NewListing};
use haggle_common::message::{Message, MessageKind, NewMessage};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub listing_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationResponse {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/listings", get(list_listings).post(create_listing))
        .route("/listings/{id}", get(get_listing))
        .route("/listings/{id}/conversations", get(listing_conversations))
        .route("/conversations", post(create_conversation))
        .route("/conversations/{id}", get(get_conversation))
        .route(
            "/conversations/{id}/messages",
            get(list_messages).post(send_message),
        )
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        warn!("Rejected request body: {rejection}");
        ApiError::BadRequest("Invalid request body")
    })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn list_listings(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Listing>>> {
    let listings = state
        .listings
        .load()
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch listings"))?;
    Ok(Json(listings))
}

async fn create_listing(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewListing>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    let new_listing = body(payload)?;
    let listing = state
        .listings
        .add(new_listing)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to create listing"))?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Listing>> {
    state
        .listings
        .get(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch listing"))?
        .map(Json)
        .ok_or(ApiError::NotFound("Listing not found"))
}

async fn listing_conversations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ConversationRecord>>> {
    let records = state
        .conversations
        .for_listing(&ListingId(id))
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch conversations"))?;
    Ok(Json(records))
}

async fn create_conversation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateConversationResponse>)> {
    let listing_id = body(payload)?
        .listing_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::BadRequest("Listing ID is required"))?;

    let conversation_id = state
        .conversations
        .create(ListingId(listing_id))
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to create conversation"))?;
    Ok((
        StatusCode::CREATED,
        Json(CreateConversationResponse { conversation_id }),
    ))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConversationRecord>> {
    let id: ConversationId = id
        .parse()
        .map_err(|_| ApiError::NotFound("Conversation not found"))?;
    state
        .conversations
        .record(id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch conversation"))?
        .map(Json)
        .ok_or(ApiError::NotFound("Conversation not found"))
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    // An id that is not a UUID can never name a log, so it reads like any
    // other conversation without messages.
    let Ok(id) = id.parse::<ConversationId>() else {
        return Ok(Json(Vec::new()));
    };
    let messages = state
        .conversations
        .messages(id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch messages"))?;
    Ok(Json(messages))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<NewMessage>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let id: ConversationId = id
        .parse()
        .map_err(|_| ApiError::NotFound("Conversation not found"))?;
    let kind = MessageKind::try_from(body(payload)?).map_err(|e| {
        warn!("Rejected message for {id}: {e}");
        ApiError::BadRequest("Invalid message")
    })?;

    let message = state
        .conversations
        .append(id, kind)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to send message"))?;
    Ok((StatusCode::CREATED, Json(message)))
}
