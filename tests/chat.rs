mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use common::{Account, BASE_URL, MAX_UPLOAD_BYTES, TestApp};
use serde_json::{Value, json};

async fn start(app: &TestApp, from: &Account, to: &Account, property_id: Option<&str>) -> (StatusCode, Value) {
    let response = app
        .server
        .post("/api/chat/conversations")
        .authorization_bearer(&from.token)
        .json(&json!({ "participant2Id": to.id, "propertyId": property_id }))
        .await;

    (response.status_code(), response.json::<Value>()["conversation"].clone())
}

async fn send(app: &TestApp, from: &Account, conversation_id: &str, content: &str) -> Value {
    let response = app
        .server
        .post("/api/chat/messages")
        .authorization_bearer(&from.token)
        .json(&json!({ "conversationId": conversation_id, "content": content }))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json::<Value>()["message"].clone()
}

async fn inbox(app: &TestApp, user: &Account) -> Vec<Value> {
    let body: Value = app
        .server
        .get("/api/chat/conversations")
        .authorization_bearer(&user.token)
        .await
        .json();

    body["conversations"].as_array().unwrap().clone()
}

async fn poll(app: &TestApp, user: &Account, conversation_id: &str, after: Option<&str>) -> Vec<Value> {
    let mut request = app
        .server
        .get("/api/chat/messages")
        .add_query_param("conversationId", conversation_id)
        .authorization_bearer(&user.token);
    if let Some(after) = after {
        request = request.add_query_param("after", after);
    }

    let response = request.await;
    response.assert_status_ok();

    response.json::<Value>()["messages"].as_array().unwrap().clone()
}

#[tokio::test]
async fn conversations_are_reused_per_pair_and_property() {
    let app = TestApp::new().await;
    let owner = app.sign_in_owner("owner@example.com").await;
    let customer = app.sign_in("buyer@example.com").await;
    let property_id = app.create_property(&owner, "RENT", "ROOM").await;

    let (status, first) = start(&app, &customer, &owner, Some(property_id.as_str())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["participant1"]["id"], customer.id.as_str());
    assert_eq!(first["participant2"]["id"], owner.id.as_str());
    assert_eq!(first["property"]["id"], property_id.as_str());

    // Same pair, other direction, same listing
    let (status, again) = start(&app, &owner, &customer, Some(property_id.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["id"], first["id"]);

    // No listing is a different thread
    let (status, general) = start(&app, &customer, &owner, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(general["id"], first["id"]);
    assert!(general["property"].is_null());

    let (status, _) = start(&app, &owner, &customer, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn conversation_requests_are_validated() {
    let app = TestApp::new().await;
    let customer = app.sign_in("buyer@example.com").await;

    let missing = app
        .server
        .post("/api/chat/conversations")
        .authorization_bearer(&customer.token)
        .json(&json!({}))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(missing.json::<Value>()["error"], "participant2Id is required");

    let (status, _) = start(&app, &customer, &customer, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.server
        .post("/api/chat/conversations")
        .authorization_bearer(&customer.token)
        .json(&json!({ "participant2Id": "nobody" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn messages_flow_and_unread_counts() {
    let app = TestApp::new().await;
    let owner = app.sign_in_owner("owner@example.com").await;
    let customer = app.sign_in("buyer@example.com").await;
    let stranger = app.sign_in("stranger@example.com").await;

    let (_, conversation) = start(&app, &customer, &owner, None).await;
    let conversation_id = conversation["id"].as_str().unwrap().to_string();

    let sent = send(&app, &customer, &conversation_id, "Is it still available?").await;
    assert_eq!(sent["content"], "Is it still available?");
    assert_eq!(sent["sender"]["id"], customer.id.as_str());
    send(&app, &customer, &conversation_id, "Could I see it on Friday?").await;

    let owner_inbox = inbox(&app, &owner).await;
    assert_eq!(owner_inbox.len(), 1);
    assert_eq!(owner_inbox[0]["unreadCount"], 2);
    assert_eq!(owner_inbox[0]["lastMessage"]["content"], "Could I see it on Friday?");
    assert_eq!(owner_inbox[0]["lastMessage"]["senderId"], customer.id.as_str());

    // The sender's own messages never count as unread
    assert_eq!(inbox(&app, &customer).await[0]["unreadCount"], 0);

    let messages = poll(&app, &owner, &conversation_id, None).await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "Is it still available?");
    assert_eq!(messages[1]["sender"]["id"], customer.id.as_str());

    assert_eq!(inbox(&app, &owner).await[0]["unreadCount"], 0);

    let cursor = messages[1]["createdAt"].as_str().unwrap().to_string();
    assert!(poll(&app, &owner, &conversation_id, Some(&cursor)).await.is_empty());

    app.server
        .get("/api/chat/messages")
        .add_query_param("conversationId", &conversation_id)
        .authorization_bearer(&stranger.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get(&format!("/api/chat/conversations/{conversation_id}"))
        .authorization_bearer(&stranger.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let detail: Value = app
        .server
        .get(&format!("/api/chat/conversations/{conversation_id}"))
        .authorization_bearer(&owner.token)
        .await
        .json();
    assert_eq!(detail["conversation"]["id"], conversation_id.as_str());
    assert_eq!(detail["conversation"]["currentUserId"], owner.id.as_str());
}

#[tokio::test]
async fn polling_after_a_cursor_returns_only_newer_messages() {
    let app = TestApp::new().await;
    let owner = app.sign_in_owner("owner@example.com").await;
    let customer = app.sign_in("buyer@example.com").await;

    let (_, conversation) = start(&app, &customer, &owner, None).await;
    let conversation_id = conversation["id"].as_str().unwrap().to_string();

    send(&app, &customer, &conversation_id, "Hello").await;
    send(&app, &customer, &conversation_id, "Is parking included?").await;

    let seen = poll(&app, &owner, &conversation_id, None).await;
    assert_eq!(seen.len(), 2);
    let cursor = seen[1]["createdAt"].as_str().unwrap().to_string();

    let latest = send(&app, &customer, &conversation_id, "I can move in next month").await;

    // Not returned to the owner yet, so still unread
    assert_eq!(inbox(&app, &owner).await[0]["unreadCount"], 1);

    let newer = poll(&app, &owner, &conversation_id, Some(&cursor)).await;
    assert_eq!(newer.len(), 1);
    assert_eq!(newer[0]["id"], latest["id"]);
    assert_eq!(newer[0]["content"], "I can move in next month");

    assert_eq!(inbox(&app, &owner).await[0]["unreadCount"], 0);
}

#[tokio::test]
async fn message_requests_are_validated() {
    let app = TestApp::new().await;
    let owner = app.sign_in_owner("owner@example.com").await;
    let customer = app.sign_in("buyer@example.com").await;
    let (_, conversation) = start(&app, &customer, &owner, None).await;

    let empty = app
        .server
        .post("/api/chat/messages")
        .authorization_bearer(&customer.token)
        .json(&json!({ "conversationId": conversation["id"], "content": "   " }))
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(empty.json::<Value>()["error"], "Message cannot be empty");

    app.server
        .get("/api/chat/messages")
        .authorization_bearer(&customer.token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/chat/messages")
        .authorization_bearer(&customer.token)
        .json(&json!({ "conversationId": "missing", "content": "hello" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let attachment_only = app
        .server
        .post("/api/chat/messages")
        .authorization_bearer(&customer.token)
        .json(&json!({
            "conversationId": conversation["id"],
            "attachments": [{
                "type": "image/png",
                "url": "http://localhost:8080/uploads/plan.png",
                "name": "plan.png",
                "size": 42
            }]
        }))
        .await;
    attachment_only.assert_status(StatusCode::CREATED);
    assert_eq!(
        attachment_only.json::<Value>()["message"]["attachments"][0]["name"],
        "plan.png"
    );
}

#[tokio::test]
async fn uploads_are_stored_and_served() {
    let app = TestApp::new().await;
    let customer = app.sign_in("buyer@example.com").await;

    let form = MultipartForm::new().add_part(
        "files",
        Part::bytes(b"floor plan".to_vec())
            .file_name("plan.txt")
            .mime_type("text/plain"),
    );
    let response = app
        .server
        .post("/api/chat/upload")
        .authorization_bearer(&customer.token)
        .multipart(form)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let attachment = &body["attachments"][0];
    assert_eq!(attachment["name"], "plan.txt");
    assert_eq!(attachment["type"], "text/plain");
    assert_eq!(attachment["size"], 10);

    let url = attachment["url"].as_str().unwrap();
    let path = url.strip_prefix(BASE_URL).unwrap();
    let served = app.server.get(path).await;
    served.assert_status_ok();
    assert_eq!(served.text(), "floor plan");
}

#[tokio::test]
async fn upload_limits() {
    let app = TestApp::new().await;
    let customer = app.sign_in("buyer@example.com").await;

    let nothing = app
        .server
        .post("/api/chat/upload")
        .authorization_bearer(&customer.token)
        .multipart(MultipartForm::new().add_text("note", "no files here"))
        .await;
    nothing.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(nothing.json::<Value>()["error"], "No files provided");

    let oversized = MultipartForm::new().add_part(
        "files",
        Part::bytes(vec![b'x'; MAX_UPLOAD_BYTES + 1])
            .file_name("big.bin")
            .mime_type("application/octet-stream"),
    );
    app.server
        .post("/api/chat/upload")
        .authorization_bearer(&customer.token)
        .multipart(oversized)
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}
