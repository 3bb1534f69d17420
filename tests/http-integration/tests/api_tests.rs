//! JSON API tests against a live server over a temp data dir.

use chrono::Utc;
use haggle_common::listing::Listing;
use haggle_common::message::{Message, MessageKind, Sender};
use haggle_http_integration::TestServer;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_reports_ok() {
    let s = TestServer::start().await;
    let resp = s.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({"status": "ok"}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lists_listings_in_file_order() {
    let s = TestServer::start().await;
    let resp = s.get("/listings").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let listings: Vec<Listing> = resp.json().await.unwrap();
    let titles: Vec<&str> = listings.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Vintage Armchair", "Mountain Bike", "Desk Lamp", "Espresso Machine"]
    );
    assert_eq!(listings[0].price, 120.5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listing_json_uses_camel_case_field_names() {
    let s = TestServer::start().await;
    let v: Value = s.get("/listings/2").await.json().await.unwrap();
    assert_eq!(v["id"], "2");
    assert_eq!(v["title"], "Mountain Bike");
    assert_eq!(v["price"], 450.0);
    assert_eq!(v["imageUrl"], "https://img.example/bike.jpg");
    assert_eq!(v["datePosted"], "2024-05-02");
    assert_eq!(v["sellerName"], "Tom");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_listing_is_404() {
    let s = TestServer::start().await;
    let resp = s.get("/listings/999").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"error": "Listing not found"})
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_listings_file_is_an_empty_catalogue() {
    let s = TestServer::start_with_listings(None).await;
    let resp = s.get("/listings").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!([]));
    assert_eq!(s.get("/listings/1").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corrupt_listings_file_is_500() {
    let s = TestServer::start_with_listings(Some(
        "id,title,description,price,location,imageUrl,datePosted,sellerName\n\
         1,Chair,Oak,not-a-price,Fitzroy,https://img.example/chair.jpg,2024-04-28,Priya\n",
    ))
    .await;
    let resp = s.get("/listings").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"error": "Failed to fetch listings"})
    );
    assert_eq!(s.get("/listings/1").await.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn posting_a_listing_appends_it() {
    let s = TestServer::start().await;
    let resp = s
        .post_json(
            "/listings",
            &json!({
                "title": "Record Player",
                "description": "Belt drive, new stylus",
                "price": 89.9,
                "location": "Coburg",
                "imageUrl": "https://img.example/record.jpg",
                "sellerName": "Mia"
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Listing = resp.json().await.unwrap();
    assert_eq!(created.id.as_str(), "5");
    assert_eq!(created.date_posted, Utc::now().date_naive().format("%Y-%m-%d").to_string());

    let fetched: Listing = s.get("/listings/5").await.json().await.unwrap();
    assert_eq!(fetched, created);
    let all: Vec<Listing> = s.get("/listings").await.json().await.unwrap();
    assert_eq!(all.len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_listings_are_400() {
    let s = TestServer::start().await;
    let resp = s
        .post_json("/listings", &json!({"title": "", "price": 10, "sellerName": "Mia"}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = s.post_json("/listings", &json!({"title": "No price"})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let all: Vec<Listing> = s.get("/listings").await.json().await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_conversation_requires_listing_id() {
    let s = TestServer::start().await;

    let resp = s.post_json("/conversations", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"error": "Listing ID is required"})
    );

    let resp = s.post_json("/conversations", &json!({"listingId": ""})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = s
        .client
        .post(s.url("/conversations"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn new_conversation_has_no_messages_and_remembers_listing() {
    let s = TestServer::start().await;
    let id = s.create_conversation("3").await;

    assert!(s.messages(id).await.is_empty());
    assert!(s.conversations_dir().join(format!("{id}.csv")).exists());

    let record: Value = s.get(&format!("/conversations/{id}")).await.json().await.unwrap();
    assert_eq!(record["conversationId"], id.to_string());
    assert_eq!(record["listingId"], "3");

    let for_listing: Vec<Value> = s.get("/listings/3/conversations").await.json().await.unwrap();
    assert_eq!(for_listing.len(), 1);
    assert_eq!(for_listing[0]["conversationId"], id.to_string());
    let none: Vec<Value> = s.get("/listings/1/conversations").await.json().await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn text_then_offer_round_trip() {
    let s = TestServer::start().await;
    let id = s.create_conversation("1").await;

    let before = Utc::now();
    let resp = s.send(id, json!({"content": "hi", "sender": "buyer"})).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Value = resp.json().await.unwrap();
    assert_eq!(first["content"], "hi");
    assert_eq!(first["sender"], "buyer");
    assert!(first["dateTime"].is_string());

    let resp = s
        .send(
            id,
            json!({"content": {"type": "offer", "price": 50}, "sender": "buyer"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let messages = s.messages(id).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, MessageKind::text(Sender::Buyer, "hi"));
    assert_eq!(messages[1].kind, MessageKind::Offer { price: 50.0 });
    assert_eq!(messages[1].sender(), Sender::Buyer);
    assert!(messages[0].date_time >= before);
    assert!(messages[0].date_time <= messages[1].date_time);

    let raw: Value = s
        .get(&format!("/conversations/{id}/messages"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(raw[1]["content"], json!({"type": "offer", "price": 50.0}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_assigns_timestamps() {
    let s = TestServer::start().await;
    let id = s.create_conversation("1").await;
    let before = Utc::now();
    let resp = s
        .send(
            id,
            json!({"content": "backdated?", "sender": "seller", "dateTime": "2001-01-01T00:00:00Z"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let sent: Message = resp.json().await.unwrap();
    assert!(sent.date_time >= before);
    assert_eq!(s.messages(id).await.last(), Some(&sent));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sequential_appends_each_persist() {
    let s = TestServer::start().await;
    let id = s.create_conversation("2").await;
    for n in 1..=5 {
        let resp = s
            .send(id, json!({"content": format!("message {n}"), "sender": "seller"}))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(s.messages(id).await.len(), n);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn seller_accepts_offer() {
    let s = TestServer::start().await;
    let id = s.create_conversation("4").await;
    s.send(id, json!({"content": {"type": "offer", "price": 240}, "sender": "buyer"}))
        .await;
    let resp = s
        .send(
            id,
            json!({"content": {"type": "accepted", "price": 240}, "sender": "seller"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let kinds: Vec<MessageKind> = s.messages(id).await.into_iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![MessageKind::Offer { price: 240.0 }, MessageKind::Accepted { price: 240.0 }]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_messages_are_400() {
    let s = TestServer::start().await;
    let id = s.create_conversation("1").await;

    for body in [
        json!({"content": {"type": "offer", "price": 10}, "sender": "seller"}),
        json!({"content": {"type": "accepted", "price": 10}, "sender": "buyer"}),
        json!({"content": {"type": "offer", "price": -5}, "sender": "buyer"}),
        json!({"content": "hi", "sender": "stranger"}),
        json!({"sender": "buyer"}),
    ] {
        let resp = s.send(id, body.clone()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
    assert!(s.messages(id).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_conversations() {
    let s = TestServer::start().await;
    let missing = "6a1c4f0e-2b7d-4e58-9f43-0c2d5e6f7a81";

    let msgs: Vec<Value> = s
        .get(&format!("/conversations/{missing}/messages"))
        .await
        .json()
        .await
        .unwrap();
    assert!(msgs.is_empty());
    let msgs: Vec<Value> = s.get("/conversations/not-a-uuid/messages").await.json().await.unwrap();
    assert!(msgs.is_empty());

    let resp = s
        .post_json(
            &format!("/conversations/{missing}/messages"),
            &json!({"content": "hello?", "sender": "buyer"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(s.conversations_dir().join(format!("{missing}.csv")).exists());
    let msgs: Vec<Value> = s
        .get(&format!("/conversations/{missing}/messages"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0]["content"], "hello?");

    let resp = s
        .post_json(
            "/conversations/not-a-uuid/messages",
            &json!({"content": "hello?", "sender": "buyer"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        s.get(&format!("/conversations/{missing}")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn legacy_log_with_seller_offer_stays_readable() {
    let s = TestServer::start().await;
    let id = s.create_conversation("2").await;
    std::fs::write(
        s.conversations_dir().join(format!("{id}.csv")),
        "dateTime,content,sender,type,price\n\
         2024-05-01T09:30:00.000Z,still for sale?,buyer,text,\n\
         2024-05-01T09:31:00.000Z,,seller,offer,60\n",
    )
    .unwrap();

    let messages = s.messages(id).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].kind, MessageKind::Offer { price: 60.0 });

    let resp = s.get(&format!("/conversation/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Accept offer of $60.00"));

    let resp = s
        .send(id, json!({"content": {"type": "accepted", "price": 60}, "sender": "seller"}))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(s.messages(id).await.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn corrupt_log_is_500() {
    let s = TestServer::start().await;
    let id = s.create_conversation("1").await;
    std::fs::write(
        s.conversations_dir().join(format!("{id}.csv")),
        "dateTime,content,sender,type,price\nnot-a-date,hi,buyer,text,\n",
    )
    .unwrap();

    let resp = s.get(&format!("/conversations/{id}/messages")).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"error": "Failed to fetch messages"})
    );
}
