//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, REDIS_URL, JWT_SECRET
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_error, assert_json, assert_status, check_test_env, fixtures::*, register_user,
    TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get_root("/health").await.expect("Request failed");
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_health_ready() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get_root("/health/ready").await.expect("Request failed");
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"], "up");
    assert_eq!(body["checks"]["redis"], "up");
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
async fn test_register_creates_customer() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (request, auth) = register_user(&server).await.unwrap();

    assert_eq!(auth.user.email, request.email);
    assert_eq!(auth.user.role, "CUSTOMER");
    assert_eq!(auth.token_type, "Bearer");
    assert!(auth.user.customer_id.is_some());
    assert!(auth.user.partner_id.is_none());
    assert!(!auth.access_token.is_empty());
    assert!(!auth.refresh_token.is_empty());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (request, _) = register_user(&server).await.unwrap();

    let response = server.post("/auth/register", &request).await.unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();
}

#[tokio::test]
async fn test_register_weak_password() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let mut request = RegisterRequest::unique();
    request.password = "short".to_string();

    let response = server.post("/auth/register", &request).await.unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (register_req, _) = register_user(&server).await.unwrap();

    let login_req = LoginRequest::from_register(&register_req);
    let response = server.post("/auth/login", &login_req).await.unwrap();
    let auth: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(auth.user.name, register_req.name);
    assert!(auth.expires_in > 0);
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let login_req = LoginRequest {
        email: "nobody@example.com".to_string(),
        password: "WrongPass123!".to_string(),
    };

    let response = server.post("/auth/login", &login_req).await.unwrap();
    assert_error(response, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refresh_token_rotates() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let refresh_req = RefreshTokenRequest {
        refresh_token: auth.refresh_token.clone(),
    };
    let response = server.post("/auth/refresh", &refresh_req).await.unwrap();
    let tokens: AuthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_ne!(tokens.refresh_token, auth.refresh_token);

    // The consumed token cannot be replayed
    let response = server.post("/auth/refresh", &refresh_req).await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_me_requires_auth() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/auth/me").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server.get_auth("/auth/me", "not-a-jwt").await.unwrap();
    assert_error(response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_me_returns_current_user() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server.get_auth("/auth/me", &auth.access_token).await.unwrap();
    let me: CurrentUserResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(me.id, auth.user.id);
}

// ============================================================================
// Partner Tests
// ============================================================================

#[tokio::test]
async fn test_partner_application_starts_pending() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server
        .post_auth("/partners/apply", &auth.access_token, &ApplyPartnerRequest::unique())
        .await
        .unwrap();
    let partner: PartnerResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(partner.status, "PENDING");
    assert_eq!(partner.user_id, auth.user.id);
    assert!(!partner.is_available_now);

    // A second application from the same account is refused
    let response = server
        .post_auth("/partners/apply", &auth.access_token, &ApplyPartnerRequest::unique())
        .await
        .unwrap();
    assert_status(response, StatusCode::CONFLICT).await.unwrap();

    let response = server.get_auth("/partners/self", &auth.access_token).await.unwrap();
    let own: PartnerResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(own.id, partner.id);
}

#[tokio::test]
async fn test_partner_updates_own_profile() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();
    let response = server
        .post_auth("/partners/apply", &auth.access_token, &ApplyPartnerRequest::unique())
        .await
        .unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .patch_auth(
            "/partners/self",
            &auth.access_token,
            &json!({ "customer_message": "Support mains welcome" }),
        )
        .await
        .unwrap();
    let partner: PartnerResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(partner.customer_message.as_deref(), Some("Support mains welcome"));

    // An empty game list is refused
    let response = server
        .patch_auth("/partners/self", &auth.access_token, &json!({ "games": ["  "] }))
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

#[tokio::test]
async fn test_favorites_are_idempotent() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, partner_auth) = register_user(&server).await.unwrap();
    let response = server
        .post_auth("/partners/apply", &partner_auth.access_token, &ApplyPartnerRequest::unique())
        .await
        .unwrap();
    let partner: PartnerResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let (_, customer) = register_user(&server).await.unwrap();
    let path = format!("/favorites/{}", partner.id);
    for _ in 0..2 {
        let response = server.put_auth(&path, &customer.access_token, &json!({})).await.unwrap();
        assert_status(response, StatusCode::NO_CONTENT).await.unwrap();
    }
    for _ in 0..2 {
        let response = server.delete_auth(&path, &customer.access_token).await.unwrap();
        assert_status(response, StatusCode::NO_CONTENT).await.unwrap();
    }

    let response = server
        .put_auth("/favorites/1", &customer.access_token, &json!({}))
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_partner_directory_is_public() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/partners?limit=5").await.unwrap();
    let partners: Vec<Value> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(partners.len() <= 5);
}

#[tokio::test]
async fn test_unknown_partner_is_not_found() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/partners/1").await.unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();

    let response = server.get("/partners/not-an-id").await.unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "INVALID_PATH_PARAMETER")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_schedules_require_partner_profile() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server.get_auth("/schedules", &auth.access_token).await.unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

// ============================================================================
// Coin Tests
// ============================================================================

#[tokio::test]
async fn test_new_wallet_is_empty() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server.get_auth("/coins", &auth.access_token).await.unwrap();
    let wallet: CoinBalanceResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(wallet.coin_balance, 0);
    assert_eq!(wallet.total_recharged, 0);
    assert_eq!(wallet.total_spent, 0);
}

#[tokio::test]
async fn test_recharge_order_is_pending() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server
        .post_auth("/coins/recharge", &auth.access_token, &json!({ "coin_amount": 100 }))
        .await
        .unwrap();
    let order: RechargeResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert!(order.order_number.starts_with("RECHARGE-"));
    assert_eq!(order.coin_amount, 100);
    assert_eq!(order.status, "PENDING");

    // Nothing is credited before the gateway confirms
    let response = server.get_auth("/coins", &auth.access_token).await.unwrap();
    let wallet: CoinBalanceResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(wallet.coin_balance, 0);
}

#[tokio::test]
async fn test_recharge_callback_credits_once() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server
        .post_auth("/coins/recharge", &auth.access_token, &json!({ "coin_amount": 80 }))
        .await
        .unwrap();
    let order: RechargeResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let form = [
        ("MerchantTradeNo", order.order_number.as_str()),
        ("RtnCode", "1"),
        ("TradeNo", "GW0001"),
        ("TradeAmt", "80"),
    ];
    for _ in 0..2 {
        let response = server.post_form("/payment/callback", &form).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "1|OK");
    }

    let response = server.get_auth("/coins", &auth.access_token).await.unwrap();
    let wallet: CoinBalanceResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(wallet.coin_balance, 80);
    assert_eq!(wallet.total_recharged, 80);
}

// ============================================================================
// Chat & Notification Tests
// ============================================================================

#[tokio::test]
async fn test_fresh_account_has_nothing_unread() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server.get_auth("/chat/unread-count", &auth.access_token).await.unwrap();
    let unread: UnreadCountResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(unread.unread_count, 0);

    let response = server.get_auth("/chat/rooms", &auth.access_token).await.unwrap();
    let rooms: Vec<Value> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(rooms.is_empty());

    let response = server.get_auth("/notifications", &auth.access_token).await.unwrap();
    let notifications: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(notifications["unread_count"], 0);
}

#[tokio::test]
async fn test_chat_room_requires_membership() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server
        .post_auth("/chat/rooms/1/messages", &auth.access_token, &json!({ "content": "hi" }))
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_free_chat_reaches_message_limit() {
    if !check_test_env().await {
        return;
    }

    let mut config = integration_tests::test_config().unwrap();
    config.platform.free_chat_message_limit = 5;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");
    let (_, customer) = register_user(&server).await.unwrap();
    let (_, player) = register_user(&server).await.unwrap();

    let response = server
        .post_auth("/partners/apply", &player.access_token, &ApplyPartnerRequest::unique())
        .await
        .unwrap();
    let partner: PartnerResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let body = json!({ "partner_id": partner.id });
    let response = server
        .post_auth("/chat/rooms/free-chat", &customer.access_token, &body)
        .await
        .unwrap();
    let room: FreeChatRoomResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(room.created);
    assert!(room.booking_id.is_none());

    // Asking again returns the same room
    let response = server
        .post_auth("/chat/rooms/free-chat", &customer.access_token, &body)
        .await
        .unwrap();
    let again: FreeChatRoomResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(again.id, room.id);
    assert!(!again.created);

    // A player cannot open a free chat with themselves
    let response = server
        .post_auth("/chat/rooms/free-chat", &player.access_token, &body)
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();

    // Warm the player's cached unread count
    let response = server.get_auth("/chat/unread-count", &player.access_token).await.unwrap();
    let unread: UnreadCountResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(unread.unread_count, 0);

    let path = format!("/chat/rooms/{}/messages", room.id);
    for i in 1..=5 {
        let response = server
            .post_auth(&path, &customer.access_token, &json!({ "content": format!("hello {i}") }))
            .await
            .unwrap();
        assert_status(response, StatusCode::CREATED).await.unwrap();
    }

    let response = server
        .post_auth(&path, &customer.access_token, &json!({ "content": "one more" }))
        .await
        .unwrap();
    assert_error(response, StatusCode::BAD_REQUEST, "FREE_CHAT_LIMIT")
        .await
        .unwrap();

    // Sending refreshed the other member's count
    let response = server.get_auth("/chat/unread-count", &player.access_token).await.unwrap();
    let unread: UnreadCountResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(unread.unread_count, 5);
}

// ============================================================================
// Admin & Cron Tests
// ============================================================================

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let (_, auth) = register_user(&server).await.unwrap();

    let response = server.get_auth("/admin/users", &auth.access_token).await.unwrap();
    assert_error(response, StatusCode::FORBIDDEN, "ADMIN_REQUIRED")
        .await
        .unwrap();

    let response = server
        .post_auth("/admin/coins/add", &auth.access_token, &json!({ "user_id": auth.user.id, "amount": 500 }))
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();
}

#[tokio::test]
async fn test_cron_rejects_wrong_secret() {
    if !check_test_env().await {
        return;
    }

    let mut config = integration_tests::test_config().unwrap();
    config.cron.secret = Some("cron-test-secret".to_string());
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let response = server
        .post_auth("/cron/complete-bookings", "wrong-secret", &json!({}))
        .await
        .unwrap();
    assert_error(response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN")
        .await
        .unwrap();

    let response = server
        .post_auth("/cron/complete-bookings", "cron-test-secret", &json!({}))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(body.is_object());
}
