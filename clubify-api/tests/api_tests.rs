/// End-to-end API tests against a real PostgreSQL
///
/// Skipped when `DATABASE_URL` is not set. Records are created with unique
/// e-mails so the tests can share one database.

mod common;

use axum::http::{Method, StatusCode};
use clubify_shared::models::user::UserRole;
use common::{call, TestContext};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_signup_login_and_bearer_token() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let email = format!("Signup-{}@Example.com", uuid::Uuid::new_v4().simple());
    let (status, body) = call(
        &ctx.app,
        Method::POST,
        "/api/auth/signup",
        &[],
        Some(json!({ "name": "Sam Signup", "email": email, "password": "password123" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert_eq!(body["user"]["role"], "member");
    assert_eq!(body["user"]["id"], body["user"]["_id"]);
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        "/api/auth/signup",
        &[],
        Some(json!({ "name": "Again", "email": email.to_uppercase(), "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User with this email already exists");

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        "/api/auth/login",
        &[],
        Some(json!({ "email": email, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = call(
        &ctx.app,
        Method::POST,
        "/api/auth/login",
        &[],
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");

    let token = body["token"].as_str().unwrap().to_string();
    let (status, body) = call(
        &ctx.app,
        Method::GET,
        "/api/test-auth",
        &[("authorization", format!("Bearer {token}"))],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Authentication working");
    assert_eq!(body["user"]["email"], email.to_lowercase());
}

#[tokio::test]
async fn test_user_id_header_accepts_email() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let lead = ctx.user(UserRole::Lead).await;

    let (status, body) = call(
        &ctx.app,
        Method::GET,
        "/api/test-auth",
        &[("user-id", lead.email.clone())],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["_id"], lead.id.to_string());

    let (status, body) = call(
        &ctx.app,
        Method::GET,
        "/api/test-auth",
        &[("user-id", "nobody@example.com".to_string())],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_role_gate_message() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let member = ctx.user(UserRole::Member).await;

    let (status, body) = ctx
        .call_as(
            &member,
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "Nope", "assignedTo": member.id })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Insufficient permissions. Required: lead or board, Current: member"
    );

    let (status, _) = ctx.call_as(&member, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_gate_runs_before_body_rules() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let member = ctx.user(UserRole::Member).await;
    let lead = ctx.user(UserRole::Lead).await;
    let some_id = uuid::Uuid::new_v4();

    let officer_routes = [
        (Method::POST, "/api/tasks".to_string()),
        (Method::POST, "/api/events".to_string()),
        (Method::POST, "/api/products".to_string()),
        (Method::POST, "/api/sales".to_string()),
        (Method::POST, "/api/clubs".to_string()),
        (Method::PUT, format!("/api/proposals/{some_id}/review")),
        (Method::PUT, format!("/api/users/{some_id}")),
    ];

    for (method, uri) in officer_routes {
        let (status, body) = ctx.call_as(&member, method.clone(), &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}: {body}");
        assert!(body["details"].is_null(), "{method} {uri}: {body}");
    }

    let (status, _) = ctx
        .call_as(&member, Method::PUT, "/api/proposals/not-a-uuid/review", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .call_as(&member, Method::GET, "/api/users?role=emperor", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .call_as(&lead, Method::PUT, &format!("/api/users/{some_id}"), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Insufficient permissions. Required: board, Current: lead"
    );
}

#[tokio::test]
async fn test_blank_titles_rejected() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let lead = ctx.user(UserRole::Lead).await;
    let member = ctx.user(UserRole::Member).await;

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "   ", "assignedTo": member.id })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["details"][0]["field"], "title");

    let (status, _) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/events",
            Some(json!({ "title": "\t", "startDate": "2030-01-01T10:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .call_as(
            &member,
            Method::POST,
            "/api/proposals",
            Some(json!({ "title": " ", "description": "Something" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let lead = ctx.user(UserRole::Lead).await;
    let member = ctx.user(UserRole::Member).await;
    let outsider = ctx.user(UserRole::Member).await;

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/tasks",
            Some(json!({
                "title": "Book the hall",
                "assignedTo": member.id,
                "club": "default-club",
                "priority": "high",
                "deadline": "2030-05-01T12:00:00Z"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Task created successfully");
    assert_eq!(body["task"]["status"], "pending");
    assert_eq!(body["task"]["priority"], "high");
    assert_eq!(body["task"]["assignedTo"]["_id"], member.id.to_string());
    assert_eq!(body["task"]["club"]["name"], "Default Club");
    let task_id = body["task"]["_id"].as_str().unwrap().to_string();

    let (_, body) = ctx.call_as(&member, Method::GET, "/api/tasks", None).await;
    assert_eq!(ids(&body["tasks"]), vec![task_id.clone()]);

    let (_, body) = ctx.call_as(&lead, Method::GET, "/api/tasks", None).await;
    assert!(ids(&body["tasks"]).contains(&task_id));

    let (_, body) = ctx.call_as(&outsider, Method::GET, "/api/tasks", None).await;
    assert!(ids(&body["tasks"]).is_empty());

    let uri = format!("/api/tasks/{task_id}");
    let (status, body) = ctx
        .call_as(&outsider, Method::PUT, &uri, Some(json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to update this task");

    let (status, body) = ctx
        .call_as(
            &member,
            Method::PUT,
            &uri,
            Some(json!({ "status": "completed", "notes": "Hall booked" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task updated successfully");
    assert_eq!(body["task"]["status"], "completed");
    assert!(body["task"]["completedAt"].is_string());
    assert_eq!(body["task"]["notes"][0]["content"], "Hall booked");
    assert_eq!(body["task"]["notes"][0]["user"]["_id"], member.id.to_string());

    let missing = format!("/api/tasks/{}", uuid::Uuid::new_v4());
    let (status, body) = ctx
        .call_as(&member, Method::PUT, &missing, Some(json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn test_proposal_review_workflow() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let member = ctx.user(UserRole::Member).await;
    let board = ctx.user(UserRole::Board).await;

    let (status, body) = ctx
        .call_as(
            &member,
            Method::POST,
            "/api/proposals",
            Some(json!({
                "title": "Robotics workshop",
                "description": "Two-day workshop",
                "category": "activity",
                "estimatedCost": 250.0,
                "requirements": ["Room", ""]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["proposal"]["status"], "pending");
    assert_eq!(body["proposal"]["requirements"], json!(["Room"]));
    let uri = format!("/api/proposals/{}/review", body["proposal"]["_id"].as_str().unwrap());

    let (status, _) = ctx
        .call_as(&member, Method::PUT, &uri, Some(json!({ "status": "approved" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .call_as(
            &board,
            Method::PUT,
            &uri,
            Some(json!({ "status": "needs_revision", "comments": "Add a budget" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proposal"]["status"], "pending");

    let (status, body) = ctx
        .call_as(&board, Method::PUT, &uri, Some(json!({ "status": "approved" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Proposal reviewed successfully");
    assert_eq!(body["proposal"]["status"], "approved");

    let reviews = body["proposal"]["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["status"], "needs_revision");
    assert_eq!(reviews[1]["reviewer"]["_id"], board.id.to_string());

    let missing = format!("/api/proposals/{}/review", uuid::Uuid::new_v4());
    let (status, body) = ctx
        .call_as(&board, Method::PUT, &missing, Some(json!({ "status": "rejected" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Proposal not found");
}

#[tokio::test]
async fn test_sales_keep_submitted_total() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let lead = ctx.user(UserRole::Lead).await;

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/products",
            Some(json!({ "name": "Club mug", "description": "Ceramic", "price": 8.0, "cost": 3.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["product"]["stock"], 0);
    let product_id = body["product"]["_id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/sales",
            Some(json!({
                "product": product_id,
                "quantity": 3,
                "unitPrice": 8.0,
                "totalAmount": 20.0,
                "buyer": { "name": "Ana" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Sale recorded successfully");
    assert_eq!(body["sale"]["totalAmount"], 20.0);
    assert_eq!(body["sale"]["product"]["name"], "Club mug");
    let sale_id = body["sale"]["_id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/sales",
            Some(json!({ "product": product_id, "quantity": 2, "unitPrice": 8.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sale"]["totalAmount"], 16.0);

    let (status, body) = ctx.call_as(&lead, Method::GET, "/api/sales", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(ids(&body["sales"]).contains(&sale_id));
    assert!(body["analytics"]["totalTransactions"].as_u64().unwrap() >= 2);
    assert!(body["analytics"]["salesByProduct"]["Club mug"]["quantity"].as_i64().unwrap() >= 5);

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/sales",
            Some(json!({ "product": uuid::Uuid::new_v4(), "quantity": 1, "unitPrice": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Referenced product does not exist");
}

#[tokio::test]
async fn test_event_schedule_and_capacity() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let lead = ctx.user(UserRole::Lead).await;
    let first = ctx.user(UserRole::Member).await;
    let second = ctx.user(UserRole::Member).await;

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/events",
            Some(json!({
                "title": "Backwards",
                "startDate": "2030-01-02T10:00:00Z",
                "endDate": "2030-01-01T10:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "endDate");

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/events",
            Some(json!({
                "title": "Tiny meetup",
                "startDate": "2030-01-01T10:00:00Z",
                "maxAttendees": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["event"]["organizer"]["_id"], lead.id.to_string());
    let attend = format!("/api/events/{}/attend", body["event"]["_id"].as_str().unwrap());

    let (status, body) = ctx.call_as(&first, Method::POST, &attend, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["attendees"].as_array().unwrap().len(), 1);

    let (status, _) = ctx.call_as(&first, Method::POST, &attend, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.call_as(&second, Method::POST, &attend, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Event is full");
}

#[tokio::test]
async fn test_messages_read_only_by_recipient() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let sender = ctx.user(UserRole::Member).await;
    let recipient = ctx.user(UserRole::Lead).await;

    let (status, body) = ctx
        .call_as(
            &sender,
            Method::POST,
            "/api/messages",
            Some(json!({ "recipient": recipient.id, "subject": "Hi", "content": "Question" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Message sent successfully");
    assert_eq!(body["data"]["isRead"], false);
    let message_id = body["data"]["_id"].as_str().unwrap().to_string();

    let (_, body) = ctx.call_as(&sender, Method::GET, "/api/messages?type=sent", None).await;
    assert_eq!(ids(&body["messages"]), vec![message_id.clone()]);

    let (_, body) = ctx.call_as(&recipient, Method::GET, "/api/messages", None).await;
    assert_eq!(ids(&body["messages"]), vec![message_id.clone()]);

    let uri = format!("/api/messages/{message_id}/read");
    let (status, body) = ctx.call_as(&sender, Method::PUT, &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to mark this message as read");

    let (status, body) = ctx.call_as(&recipient, Method::PUT, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Message marked as read");

    let (_, body) = ctx.call_as(&recipient, Method::GET, "/api/messages", None).await;
    assert_eq!(body["messages"][0]["isRead"], true);
}

#[tokio::test]
async fn test_send_email_rules() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let sender = ctx.user(UserRole::Member).await;
    let lead = ctx.user(UserRole::Lead).await;
    let member = ctx.user(UserRole::Member).await;

    let (status, body) = ctx
        .call_as(&sender, Method::POST, "/api/send-email", Some(json!({ "subject": "Hi" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Recipient, subject, and message are required");

    let (status, body) = ctx
        .call_as(
            &sender,
            Method::POST,
            "/api/send-email",
            Some(json!({ "recipientId": uuid::Uuid::new_v4(), "subject": "Hi", "message": "Hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Recipient not found");

    let (status, body) = ctx
        .call_as(
            &sender,
            Method::POST,
            "/api/send-email",
            Some(json!({ "recipientId": member.id, "subject": "Hi", "message": "Hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Can only send emails to leads or board members");

    let (status, body) = ctx
        .call_as(
            &sender,
            Method::POST,
            "/api/send-email",
            Some(json!({ "recipientId": lead.id, "subject": "Budget", "message": "<b>Hello</b>" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], format!("Email sent successfully to {}", lead.name));
    assert_eq!(body["recipient"]["role"], "lead");

    let sent = ctx.mailer.sent();
    let email = sent.last().unwrap();
    assert_eq!(email.to[0].email, lead.email);
    assert_eq!(email.reply_to.email, sender.email);
    assert!(email.html.contains("&lt;b&gt;Hello&lt;/b&gt;"));

    ctx.mailer.fail.store(true, Ordering::SeqCst);
    let (status, body) = ctx
        .call_as(
            &sender,
            Method::POST,
            "/api/send-email",
            Some(json!({ "recipientId": lead.id, "subject": "Again", "message": "Hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Failed to send email");
}

#[tokio::test]
async fn test_board_manages_users() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let board = ctx.user(UserRole::Board).await;
    let lead = ctx.user(UserRole::Lead).await;
    let member = ctx.user(UserRole::Member).await;

    let (status, body) = ctx.call_as(&lead, Method::GET, "/api/users?role=member", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = ids(&body["users"]);
    assert!(listed.contains(&member.id.to_string()));
    assert!(!listed.contains(&lead.id.to_string()));

    let uri = format!("/api/users/{}", member.id);
    let (status, _) = ctx
        .call_as(&lead, Method::PUT, &uri, Some(json!({ "role": "lead" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .call_as(&board, Method::PUT, &uri, Some(json!({ "isActive": false })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isActive"], false);

    let (status, body) = ctx.call_as(&member, Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Account is deactivated");
}

#[tokio::test]
async fn test_default_club_endpoints() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };

    let (status, body) = call(&ctx.app, Method::POST, "/api/init-default-club", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Default club initialized");
    assert_eq!(body["club"]["name"], "Default Club");
    assert_eq!(body["club"]["isDefault"], true);
    let club_id = body["club"]["_id"].clone();

    let (status, body) = call(&ctx.app, Method::GET, "/api/default-club-id", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clubId"], club_id);

    let (_, body) = call(&ctx.app, Method::POST, "/api/init-default-club", &[], None).await;
    assert_eq!(body["club"]["_id"], club_id);
}

#[tokio::test]
async fn test_club_create_and_join() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let lead = ctx.user(UserRole::Lead).await;
    let member = ctx.user(UserRole::Member).await;

    let (status, body) = ctx
        .call_as(
            &lead,
            Method::POST,
            "/api/clubs",
            Some(json!({ "name": "Chess", "description": "Weekly games", "category": "social" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["club"]["admin"]["_id"], lead.id.to_string());
    assert_eq!(body["club"]["members"][0]["role"], "admin");
    let join = format!("/api/clubs/{}/join", body["club"]["_id"].as_str().unwrap());

    let (status, body) = ctx.call_as(&member, Method::POST, &join, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["club"]["members"].as_array().unwrap().len(), 2);

    let (status, body) = ctx.call_as(&member, Method::POST, &join, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Already a member of this club");
    assert_eq!(body["club"]["members"].as_array().unwrap().len(), 2);
}
