/*!
 * End-to-end tests of the HTTP surface against a fake chat service
 */

use reqwest::StatusCode;
use serde_json::{json, Value};

use mtbridge::session::Role;

use crate::common::fake_chat_service::{ChatServiceMode, FakeChatService};
use crate::common::{app_context, app_context_with, chat_config, marking_service, spawn_app};

async fn post_json(url: &str, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new().post(url).json(&body).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_chat_withoutSession_shouldReturnFreshSessionAndReply() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let app = spawn_app(app_context(&chat_service.base_url, None)).await;

    let (status, body) = post_json(&format!("{}/api/chat", app), json!({"message": "Hi"})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(uuid::Uuid::parse_str(body["session_id"].as_str().unwrap()).is_ok());
    assert_eq!(body["translated"], "");
    assert_eq!(body["reply"], "reply to: Hi");

    let sent = &chat_service.requests()[0];
    assert_eq!(sent["model"], "qwen2.5-coder:1.5b");
    assert_eq!(sent["max_tokens"], 1024);
}

#[tokio::test]
async fn test_chat_sameSessionWithSystemPrompt_shouldKeepSystemFirstAndUserOrder() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let ctx = app_context(&chat_service.base_url, None);
    let app = spawn_app(ctx.clone()).await;
    let url = format!("{}/api/chat", app);

    let (status, _) = post_json(&url, json!({"message": "first", "session_id": "conv-1"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = post_json(
        &url,
        json!({"message": "second", "session_id": "conv-1", "system_prompt": "Answer in English."}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "conv-1");

    let session = ctx.sessions().snapshot("conv-1").unwrap();
    assert_eq!(session.messages[0].role, Role::System);
    assert_eq!(session.messages[0].content, "Answer in English.");
    let users: Vec<_> = session.messages_with_role(Role::User).map(|m| m.content.clone()).collect();
    assert_eq!(users, vec!["first", "second"]);

    let roles: Vec<_> = chat_service.last_messages().into_iter().map(|(role, _)| role).collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
}

#[tokio::test]
async fn test_chat_withTranslation_shouldSendSurrogateOnlyForLatestUserTurn() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let ctx = app_context(&chat_service.base_url, Some(marking_service()));
    let app = spawn_app(ctx.clone()).await;
    let url = format!("{}/api/chat", app);

    post_json(&url, json!({"message": "salam", "session_id": "s"})).await;
    let (status, body) = post_json(
        &url,
        json!({"message": "salam", "session_id": "s", "use_translation": true}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["translated"], "EN:salam");
    assert_eq!(
        chat_service.last_messages(),
        vec![
            ("user".to_string(), "salam".to_string()),
            ("assistant".to_string(), "reply to: salam".to_string()),
            ("user".to_string(), "EN:salam".to_string()),
        ]
    );

    let stored = ctx.sessions().snapshot("s").unwrap();
    let user_turns: Vec<_> = stored.messages_with_role(Role::User).map(|m| m.content.clone()).collect();
    assert_eq!(user_turns, vec!["salam", "salam"]);
}

#[tokio::test]
async fn test_chat_withoutMessage_shouldBeBadRequest() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let ctx = app_context(&chat_service.base_url, None);
    let app = spawn_app(ctx.clone()).await;

    let (status, body) = post_json(&format!("{}/api/chat", app), json!({"session_id": "s"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(ctx.sessions().is_empty());
    assert!(chat_service.requests().is_empty());
}

#[tokio::test]
async fn test_chat_malformedBody_shouldBeBadRequest() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let app = spawn_app(app_context(&chat_service.base_url, None)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", app))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_translationWithoutEngine_shouldBeUnavailable() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let app = spawn_app(app_context(&chat_service.base_url, None)).await;

    let (status, body) = post_json(
        &format!("{}/api/chat", app),
        json!({"message": "salam", "use_translation": true}),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "service_unavailable");
}

#[tokio::test]
async fn test_chat_brokenChatService_shouldBeBadGateway() {
    let chat_service = FakeChatService::start(ChatServiceMode::Broken).await;
    let app = spawn_app(app_context(&chat_service.base_url, None)).await;

    let (status, body) = post_json(&format!("{}/api/chat", app), json!({"message": "hello"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "upstream_error");
}

#[tokio::test]
async fn test_chat_unreachableChatService_shouldBeBadGateway() {
    let app = spawn_app(app_context("http://127.0.0.1:9", None)).await;
    let (status, _) = post_json(&format!("{}/api/chat", app), json!({"message": "hello"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_chat_chatServiceTimeout_shouldBeBadGatewayAndKeepUserTurn() {
    let chat_service = FakeChatService::start(ChatServiceMode::Stall { delay_ms: 3000 }).await;
    let config = mtbridge::app_config::ChatConfig {
        timeout_secs: 1,
        ..chat_config(&chat_service.base_url)
    };
    let ctx = app_context_with(config, None);
    let app = spawn_app(ctx.clone()).await;

    let started = std::time::Instant::now();
    let (status, body) = post_json(&format!("{}/api/chat", app), json!({"message": "hello", "session_id": "t"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "upstream_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("timed out"));
    assert!(started.elapsed() < std::time::Duration::from_millis(2900));

    let stored = ctx.sessions().snapshot("t").unwrap();
    assert_eq!(stored.messages.len(), 1);
    assert_eq!(stored.messages[0].role, Role::User);
}

#[tokio::test]
async fn test_clear_shouldDropSessionAndAlwaysSucceed() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let ctx = app_context(&chat_service.base_url, None);
    let app = spawn_app(ctx.clone()).await;

    post_json(&format!("{}/api/chat", app), json!({"message": "hi", "session_id": "gone"})).await;
    assert!(ctx.sessions().snapshot("gone").is_some());

    let (status, body) = post_json(&format!("{}/api/clear", app), json!({"session_id": "gone"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    assert!(ctx.sessions().snapshot("gone").is_none());

    let (status, body) = post_json(&format!("{}/api/clear", app), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_health_shouldReportTranslatorAvailability() {
    let without = spawn_app(app_context("http://127.0.0.1:9", None)).await;
    let body: Value = reqwest::get(format!("{}/api/health", without)).await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "translator": false}));

    let with = spawn_app(app_context("http://127.0.0.1:9", Some(marking_service()))).await;
    let body: Value = reqwest::get(format!("{}/api/health", with)).await.unwrap().json().await.unwrap();
    assert_eq!(body["translator"], true);
}

#[tokio::test]
async fn test_send_shouldTranslateAndRelay() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let app = spawn_app(app_context(&chat_service.base_url, Some(marking_service()))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/send", app))
        .form(&[("fa_text", "salam donya")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fa_text"], "salam donya");
    assert_eq!(body["en_text"], "EN:salam EN:donya");
    assert_eq!(body["ollama_response"], "reply to: EN:salam EN:donya");
    assert!(body["duration_sec"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_send_brokenChatService_shouldStillSucceedWithErrorText() {
    let chat_service = FakeChatService::start(ChatServiceMode::Broken).await;
    let app = spawn_app(app_context(&chat_service.base_url, Some(marking_service()))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/send", app))
        .form(&[("fa_text", "salam")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["ollama_response"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_send_missingField_shouldBeBadRequest() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let app = spawn_app(app_context(&chat_service.base_url, Some(marking_service()))).await;

    let response = reqwest::Client::new()
        .post(format!("{}/send", app))
        .form(&[("other", "x")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_withoutEngine_shouldBeUnavailable() {
    let chat_service = FakeChatService::start(ChatServiceMode::Echo).await;
    let app = spawn_app(app_context(&chat_service.base_url, None)).await;

    let response = reqwest::Client::new()
        .post(format!("{}/send", app))
        .form(&[("fa_text", "salam")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
