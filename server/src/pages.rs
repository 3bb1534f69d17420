//! Server-rendered HTML pages: the listing grid, a listing's detail page and
//! a conversation thread. Pages call the stores directly.

use std::sync::Arc;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use haggle_common::conversation::ConversationId;
use haggle_common::display::{date_ago, format_price, time_ago};
use haggle_common::listing::Listing;
use haggle_common::message::{outstanding_offer, Message, MessageKind, Sender};
use serde::Deserialize;
use tracing::{error, warn};

use crate::error::StoreError;
use crate::AppState;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#f3f4f6;margin:0;padding:2rem}\
main{max-width:64rem;margin:0 auto}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(16rem,1fr));gap:1.5rem}\
.card{background:#fff;border-radius:.5rem;overflow:hidden;box-shadow:0 1px 3px #0002}\
.card img{width:100%;height:12rem;object-fit:cover}\
.card .body{padding:1rem}\
.price{font-size:1.5rem;font-weight:700;color:#16a34a}\
.muted{color:#6b7280;font-size:.875rem}\
.bubble{border-radius:.5rem;padding:.75rem;max-width:80%;margin-bottom:1rem}\
.buyer{background:#3b82f6;color:#fff;margin-left:auto;text-align:right}\
.seller{background:#e5e7eb}\
a{color:#2563eb}";

/// Escape text for inclusion in HTML content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title><style>{STYLE}</style></head>\
         <body><main>{body}</main></body></html>",
        escape(title)
    ))
}

/// A page request that could not be served.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: &'static str,
}

impl PageError {
    fn not_found(message: &'static str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    fn bad_request(message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |err| {
            error!("{context}: {err}");
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: context,
            }
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let body = format!(
            "<a href=\"/\">&larr; Back to Listings</a><h1>{}</h1><p class=\"muted\">{}</p>",
            self.status.as_u16(),
            escape(self.message)
        );
        (self.status, layout(self.message, &body)).into_response()
    }
}

type PageResult<T> = Result<T, PageError>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home_page))
        .route("/listing/{id}", get(listing_page))
        .route("/listing/{id}/conversations", post(message_seller))
        .route(
            "/conversation/{id}",
            get(conversation_page).post(conversation_form),
        )
}

fn listing_card(listing: &Listing, now: chrono::DateTime<Utc>) -> String {
    format!(
        "<a class=\"card\" href=\"/listing/{id}\">\
         <img src=\"{img}\" alt=\"{title}\">\
         <div class=\"body\"><h2>{title}</h2>\
         <span class=\"muted\">Ask</span><div class=\"price\">{price}</div>\
         <p class=\"muted\">{location}</p>\
         <p class=\"muted\">Listed {ago}</p></div></a>",
        id = escape(listing.id.as_str()),
        img = escape(&listing.image_url),
        title = escape(&listing.title),
        price = format_price(listing.price),
        location = escape(&listing.location),
        ago = escape(&date_ago(&listing.date_posted, now)),
    )
}

async fn home_page(State(state): State<Arc<AppState>>) -> PageResult<Html<String>> {
    let listings = state
        .listings
        .load()
        .await
        .map_err(PageError::store("Failed to fetch listings"))?;

    let now = Utc::now();
    let mut body = String::from("<h1>Marketplace</h1>");
    if listings.is_empty() {
        body.push_str("<p class=\"muted\">Nothing for sale yet.</p>");
    }
    body.push_str("<div class=\"grid\">");
    for listing in &listings {
        body.push_str(&listing_card(listing, now));
    }
    body.push_str("</div>");
    Ok(layout("Marketplace", &body))
}

async fn listing_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> PageResult<Html<String>> {
    let listing = state
        .listings
        .get(&id)
        .await
        .map_err(PageError::store("Failed to fetch listing"))?
        .ok_or(PageError::not_found("Listing not found"))?;

    let body = format!(
        "<a href=\"/\">&larr; Back to Listings</a>\
         <div class=\"card\"><img src=\"{img}\" alt=\"{title}\" style=\"height:24rem\">\
         <div class=\"body\"><h1>{title}</h1><div class=\"price\">{price}</div>\
         <h2>Description</h2><p>{description}</p>\
         <p><strong>Location:</strong> {location}</p>\
         <p><strong>Posted by:</strong> {seller}</p>\
         <p class=\"muted\">Listed {ago}</p>\
         <form method=\"post\" action=\"/listing/{id}/conversations\">\
         <button type=\"submit\">Message Seller</button></form>\
         </div></div>",
        id = escape(listing.id.as_str()),
        img = escape(&listing.image_url),
        title = escape(&listing.title),
        price = format_price(listing.price),
        description = escape(&listing.description),
        location = escape(&listing.location),
        seller = escape(&listing.seller_name),
        ago = escape(&date_ago(&listing.date_posted, Utc::now())),
    );
    Ok(layout(&listing.title, &body))
}

async fn message_seller(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> PageResult<Redirect> {
    let listing = state
        .listings
        .get(&id)
        .await
        .map_err(PageError::store("Failed to fetch listing"))?
        .ok_or(PageError::not_found("Listing not found"))?;

    let conversation_id = state
        .conversations
        .create(listing.id)
        .await
        .map_err(PageError::store("Failed to create conversation"))?;
    Ok(Redirect::to(&format!("/conversation/{conversation_id}")))
}

fn message_bubble(message: &Message, now: chrono::DateTime<Utc>) -> String {
    let class = match message.sender() {
        Sender::Buyer => "buyer",
        Sender::Seller => "seller",
    };
    let inner = match &message.kind {
        MessageKind::Text { content, .. } => format!("<p>{}</p>", escape(content)),
        MessageKind::Offer { price } => {
            format!("<p><strong>New Offer:</strong></p><p>{}</p>", format_price(*price))
        }
        MessageKind::Accepted { price } => {
            format!("<p><strong>Offer Accepted:</strong></p><p>{}</p>", format_price(*price))
        }
    };
    format!(
        "<div class=\"bubble {class}\">{inner}<p class=\"muted\">{}</p></div>",
        time_ago(message.date_time, now)
    )
}

async fn conversation_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> PageResult<Html<String>> {
    let id: ConversationId = id
        .parse()
        .map_err(|_| PageError::not_found("Conversation not found"))?;
    let messages = state
        .conversations
        .messages(id)
        .await
        .map_err(PageError::store("Failed to fetch messages"))?;
    let record = state
        .conversations
        .record(id)
        .await
        .map_err(PageError::store("Failed to fetch conversation"))?;

    let mut body = String::from("<a href=\"/\">&larr; Back to Listings</a>");
    if let Some(record) = &record {
        let title = match state.listings.get(record.listing_id.as_str()).await {
            Ok(Some(listing)) => listing.title,
            Ok(None) => format!("Listing {}", record.listing_id),
            Err(e) => {
                warn!("Could not load listing {} for conversation {id}: {e}", record.listing_id);
                format!("Listing {}", record.listing_id)
            }
        };
        body.push_str(&format!(
            " &middot; <a href=\"/listing/{}\">{}</a>",
            escape(record.listing_id.as_str()),
            escape(&title)
        ));
    }

    body.push_str("<div class=\"card\"><div class=\"body\"><h1>Conversation</h1><div>");
    let now = Utc::now();
    for message in &messages {
        body.push_str(&message_bubble(message, now));
    }
    body.push_str("</div>");

    body.push_str(&format!(
        "<form method=\"post\" action=\"/conversation/{id}\">\
         <select name=\"sender\"><option value=\"buyer\">as buyer</option>\
         <option value=\"seller\">as seller</option></select>\
         <input type=\"text\" name=\"message\" placeholder=\"Type a message...\">\
         <button type=\"submit\" name=\"action\" value=\"send\">Send</button>\
         <div><input type=\"number\" name=\"price\" placeholder=\"Offer amount...\" step=\"0.01\" min=\"0\">\
         <button type=\"submit\" name=\"action\" value=\"offer\">Make Offer</button></div>"
    ));
    if let Some(price) = outstanding_offer(&messages) {
        body.push_str(&format!(
            "<div><button type=\"submit\" name=\"action\" value=\"accept\">Accept offer of {}</button></div>",
            format_price(price)
        ));
    }
    body.push_str("</form></div></div>");
    Ok(layout("Conversation", &body))
}

/// Fields posted by the conversation page's form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThreadForm {
    pub message: String,
    pub price: String,
    pub sender: Option<Sender>,
    pub action: Option<String>,
}

/// Turn a form submission into the message it asks for. `Ok(None)` when
/// there is nothing to send (an empty text box).
fn form_message(form: ThreadForm, messages: &[Message]) -> PageResult<Option<MessageKind>> {
    match form.action.as_deref() {
        Some("offer") => {
            let price: f64 = form
                .price
                .trim()
                .parse()
                .map_err(|_| PageError::bad_request("Enter an offer amount"))?;
            MessageKind::offer(price)
                .map(Some)
                .map_err(|_| PageError::bad_request("Offers must be a positive amount"))
        }
        Some("accept") => {
            let price = outstanding_offer(messages)
                .ok_or(PageError::bad_request("There is no offer to accept"))?;
            MessageKind::accepted(price)
                .map(Some)
                .map_err(|_| PageError::bad_request("Offers must be a positive amount"))
        }
        _ => {
            let text = form.message.trim();
            if text.is_empty() {
                return Ok(None);
            }
            Ok(Some(MessageKind::text(
                form.sender.unwrap_or(Sender::Buyer),
                text,
            )))
        }
    }
}

async fn conversation_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<ThreadForm>,
) -> PageResult<Redirect> {
    let id: ConversationId = id
        .parse()
        .map_err(|_| PageError::not_found("Conversation not found"))?;
    let messages = state
        .conversations
        .messages(id)
        .await
        .map_err(PageError::store("Failed to fetch messages"))?;

    if let Some(kind) = form_message(form, &messages)? {
        state
            .conversations
            .append(id, kind)
            .await
            .map_err(PageError::store("Failed to send message"))?;
    }
    Ok(Redirect::to(&format!("/conversation/{id}")))
}
