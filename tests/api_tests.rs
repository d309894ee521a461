use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use frogmates::api::AuthenticatedUser;
use frogmates::config::Config;
use frogmates::services::InitDataValidator;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOT_TOKEN: &str = "123456:TEST-bot-token";
const ADMIN_TELEGRAM_ID: i64 = 1;

struct TestApp {
    router: Router,
    validator: InitDataValidator,
}

async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let db_path = std::env::temp_dir().join(format!("frogmates-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.telegram.bot_token = BOT_TOKEN.to_string();
    config.telegram.admin_telegram_id = Some(ADMIN_TELEGRAM_ID.to_string());
    config.auth.jwt_secret = "test-secret".to_string();
    configure(&mut config);

    let state = frogmates::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    TestApp {
        router: frogmates::api::router(state).await,
        validator: InitDataValidator::new(BOT_TOKEN, 0),
    }
}

impl TestApp {
    fn init_data(&self, telegram_id: i64, premium: bool, start_param: Option<&str>) -> String {
        let user = json!({
            "id": telegram_id,
            "first_name": format!("Frog{telegram_id}"),
            "username": format!("frog{telegram_id}"),
            "is_premium": premium,
        })
        .to_string();

        let mut fields = vec![
            ("query_id", "AAHtest"),
            ("user", user.as_str()),
            ("auth_date", "1700000000"),
        ];
        if let Some(code) = start_param {
            fields.push(("start_param", code));
        }

        self.validator.signed_query(&fields).unwrap()
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn login_raw(&self, init_data: &str, ip: Option<&str>) -> (StatusCode, Value) {
        let mut body = json!({ "initData": init_data });
        if let Some(ip) = ip {
            body["ipAddress"] = json!(ip);
        }
        self.request("POST", "/api/auth", None, Some(body)).await
    }

    /// Logs in and returns `(token, user)`.
    async fn login(
        &self,
        telegram_id: i64,
        premium: bool,
        start_param: Option<&str>,
        ip: Option<&str>,
    ) -> (String, Value) {
        let init_data = self.init_data(telegram_id, premium, start_param);
        let (status, body) = self.login_raw(&init_data, ip).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        assert_eq!(body["success"], true);

        let token = body["data"]["token"].as_str().unwrap().to_string();
        (token, body["data"]["user"].clone())
    }

    async fn bulk_action(&self, token: &str, action: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/admin/bulk-action",
            Some(token),
            Some(json!({ "action": action })),
        )
        .await
    }

    async fn admin_token(&self) -> String {
        self.login(ADMIN_TELEGRAM_ID, false, None, None).await.0
    }
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, body) = app.request("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
    assert!(body["data"]["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn test_authenticated_user_reaches_request_log() {
    let app = spawn_app().await;
    let (token, user) = app.login(100, false, None, None).await;
    let admin = app.admin_token().await;

    let send = |uri: &str, token: Option<&str>| {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        app.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
    };

    let response = send("/api/user", Some(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let logged = response.extensions().get::<AuthenticatedUser>().unwrap();
    assert_eq!(logged.user_id, user["id"].as_str().unwrap());

    // Rejected by the admin check, but the caller is still known
    let response = send("/api/admin/stats", Some(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.extensions().get::<AuthenticatedUser>().is_some());

    let response = send("/api/admin/stats", Some(&admin)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.extensions().get::<AuthenticatedUser>().is_some());

    let response = send("/api/health", None).await.unwrap();
    assert!(response.extensions().get::<AuthenticatedUser>().is_none());

    let response = send("/api/user", Some("garbage")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.extensions().get::<AuthenticatedUser>().is_none());
}

#[tokio::test]
async fn test_login_creates_user() {
    let app = spawn_app().await;

    let (token, user) = app.login(100, false, None, Some("1.1.1.1")).await;
    assert!(!token.is_empty());
    assert_eq!(user["telegramId"], "100");
    assert_eq!(user["firstName"], "Frog100");
    assert_eq!(user["stars"], 5);
    assert_eq!(user["referrals"], 0);
    assert_eq!(user["isAdmin"], false);
    assert_eq!(user["ipAddress"], "1.1.1.1");

    let special_id = user["specialId"].as_str().unwrap();
    assert_eq!(special_id.len(), 6);
    assert!(special_id.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_relogin_keeps_identity() {
    let app = spawn_app().await;

    let (_, first) = app.login(100, false, None, Some("1.1.1.1")).await;
    let (_, second) = app.login(100, true, None, None).await;

    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["specialId"], second["specialId"]);
    assert_eq!(second["isPremium"], true);
    assert_eq!(second["ipAddress"], "1.1.1.1");

    let (_, third) = app.login(100, true, None, Some("2.2.2.2")).await;
    assert_eq!(third["ipAddress"], "2.2.2.2");
}

#[tokio::test]
async fn test_invalid_init_data_rejected() {
    let app = spawn_app().await;

    let tampered = app.init_data(100, false, None).replace("Frog100", "Frog101");
    let (status, body) = app.login_raw(&tampered, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid data");

    let (status, _) = app.login_raw("", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign = InitDataValidator::new("999:other", 0)
        .signed_query(&[("user", r#"{"id":5,"first_name":"X"}"#)])
        .unwrap();
    let (status, _) = app.login_raw(&foreign, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_user_rejected() {
    let app = spawn_app().await;

    let no_user = app
        .validator
        .signed_query(&[("query_id", "AAH"), ("auth_date", "1700000000")])
        .unwrap();
    let (status, body) = app.login_raw(&no_user, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User data not found");
}

#[tokio::test]
async fn test_referral_credits_referrer() {
    let app = spawn_app().await;

    let (referrer_token, referrer) = app.login(100, false, None, None).await;
    let code = referrer["specialId"].as_str().unwrap().to_string();

    let (_, referred) = app.login(200, false, Some(&code), None).await;
    assert_eq!(referred["referrerId"], referrer["id"]);

    let (status, body) = app
        .request("GET", "/api/user", Some(&referrer_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["user"]["referrals"], 1);
    assert_eq!(data["user"]["stars"], 10);
    assert_eq!(data["referredUsers"].as_array().unwrap().len(), 1);
    assert_eq!(data["referredUsers"][0]["id"], referred["id"]);
    assert_eq!(
        data["referralLink"],
        format!("https://t.me/frogmates_bot/app?startapp={code}")
    );
}

#[tokio::test]
async fn test_referral_credit_happens_once() {
    let app = spawn_app().await;

    let (referrer_token, referrer) = app.login(100, false, None, None).await;
    let code = referrer["specialId"].as_str().unwrap().to_string();

    app.login(200, false, Some(&code), None).await;
    app.login(200, false, Some(&code), None).await;

    let (_, body) = app
        .request("GET", "/api/user", Some(&referrer_token), None)
        .await;
    assert_eq!(body["data"]["user"]["referrals"], 1);
    assert_eq!(body["data"]["user"]["stars"], 10);
}

#[tokio::test]
async fn test_premium_referral_bonus() {
    let app = spawn_app_with(|config| config.referral.premium_referral_bonus = 7).await;

    let (referrer_token, referrer) = app.login(100, false, None, None).await;
    let code = referrer["specialId"].as_str().unwrap().to_string();

    app.login(200, true, Some(&code), None).await;

    let (_, body) = app
        .request("GET", "/api/user", Some(&referrer_token), None)
        .await;
    assert_eq!(body["data"]["user"]["stars"], 12);
}

#[tokio::test]
async fn test_unknown_referral_code_ignored() {
    let app = spawn_app().await;

    let (_, user) = app.login(200, false, Some("000000"), None).await;
    assert_eq!(user["referrerId"], Value::Null);
    assert_eq!(user["stars"], 5);
}

#[tokio::test]
async fn test_shared_ip_flags_all_accounts() {
    let app = spawn_app().await;
    let ip = "9.9.9.9";

    let (_, first) = app.login(101, false, None, Some(ip)).await;
    assert_eq!(first["isCheater"], false);

    let (_, second) = app.login(102, false, None, Some(ip)).await;
    assert_eq!(second["isCheater"], false);

    app.login(103, false, None, Some(ip)).await;
    let (_, fourth) = app.login(104, false, None, Some(ip)).await;
    assert_eq!(fourth["isCheater"], true);
    assert_eq!(fourth["isBot"], true);

    app.login(105, false, None, Some("8.8.8.8")).await;

    let admin = app.admin_token().await;
    let (status, body) = app
        .request("GET", "/api/admin/users?filter=cheaters", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 4);

    for user in body["data"]["users"].as_array().unwrap() {
        assert_eq!(user["ipAddress"], ip);
        assert_eq!(user["isBot"], true);
    }
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = spawn_app().await;

    let (status, body) = app.request("GET", "/api/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .request("GET", "/api/user", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("GET", "/api/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request("POST", "/api/join-channel", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_forbidden_on_admin_routes() {
    let app = spawn_app().await;
    let (token, _) = app.login(100, false, None, None).await;

    for uri in ["/api/admin/stats", "/api/admin/users", "/api/admin/config"] {
        let (status, _) = app.request("GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }

    let (status, _) = app
        .request(
            "POST",
            "/api/admin/bulk-action",
            Some(&token),
            Some(json!({ "action": "unblock-all" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_configured_admin_is_elevated() {
    let app = spawn_app().await;

    let (token, user) = app.login(ADMIN_TELEGRAM_ID, false, None, None).await;
    assert_eq!(user["isAdmin"], true);
    assert_eq!(user["isVerified"], true);

    let (status, _) = app
        .request("GET", "/api/admin/stats", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blocked_user_cannot_load_profile() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (token, user) = app.login(100, false, None, None).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "userId": user["id"], "action": "block" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["isBlocked"], true);

    let (status, body) = app.request("GET", "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account is blocked");

    app.request(
        "POST",
        "/api/admin/user-action",
        Some(&admin),
        Some(json!({ "userId": user["id"], "action": "unblock" })),
    )
    .await;

    let (status, _) = app.request("GET", "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_user_action_validation() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (_, user) = app.login(100, false, None, None).await;

    let (status, _) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "userId": user["id"], "action": "delete" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "action": "block" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "userId": "missing", "action": "block" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_actions_update_counters() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let (_, referrer) = app.login(100, false, None, None).await;
    let code = referrer["specialId"].as_str().unwrap().to_string();
    app.login(200, false, Some(&code), None).await;

    let (_, body) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "userId": referrer["id"], "action": "reset-referrals" })),
        )
        .await;
    assert_eq!(body["data"]["user"]["referrals"], 0);
    assert_eq!(body["data"]["user"]["stars"], 10);

    let (_, body) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "userId": referrer["id"], "action": "reset-stars" })),
        )
        .await;
    assert_eq!(body["data"]["user"]["stars"], 5);

    let (_, body) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "userId": referrer["id"], "action": "mark-as-cheater" })),
        )
        .await;
    assert_eq!(body["data"]["user"]["isCheater"], true);
    assert_eq!(body["data"]["user"]["isBot"], true);

    let (_, body) = app
        .request(
            "POST",
            "/api/admin/user-action",
            Some(&admin),
            Some(json!({ "userId": referrer["id"], "action": "unmark-as-cheater" })),
        )
        .await;
    assert_eq!(body["data"]["user"]["isCheater"], false);
    assert_eq!(body["data"]["user"]["isBot"], false);
}

#[tokio::test]
async fn test_bulk_actions() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for telegram_id in 101..=103 {
        app.login(telegram_id, false, None, Some("7.7.7.7")).await;
    }
    app.login(104, false, None, Some("6.6.6.6")).await;

    let (status, body) = app.bulk_action(&admin, "mark-multiple-ips-as-cheaters").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let (_, body) = app.bulk_action(&admin, "block-all-cheaters").await;
    assert_eq!(body["data"]["count"], 3);

    let (_, body) = app.bulk_action(&admin, "unblock-all").await;
    assert_eq!(body["data"]["count"], 3);

    let (_, body) = app.bulk_action(&admin, "block-all").await;
    assert_eq!(body["data"]["count"], 4);

    let (status, _) = app
        .request("GET", "/api/admin/stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "admin must survive block-all");

    let (status, _) = app.bulk_action(&admin, "explode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    app.login(100, true, None, None).await;
    for telegram_id in 101..=103 {
        app.login(telegram_id, false, None, Some("5.5.5.5")).await;
    }

    let (status, body) = app
        .request("GET", "/api/admin/stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let stats = &body["data"]["statistics"];
    assert_eq!(stats["totalUsers"], 5);
    assert_eq!(stats["premiumUsers"], 1);
    assert_eq!(stats["verifiedUsers"], 1);
    assert_eq!(stats["cheaters"], 3);
    assert_eq!(stats["bots"], 3);
    assert_eq!(stats["honestUsers"], 2);
    assert_eq!(stats["activeUsers"], 5);
    assert_eq!(body["data"]["latestUsers"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_user_listing() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for telegram_id in 100..105 {
        app.login(telegram_id, false, None, None).await;
    }

    let (status, body) = app
        .request("GET", "/api/admin/users?page=2&limit=2", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 6);
    assert_eq!(body["data"]["pagination"]["pages"], 3);
    assert_eq!(body["data"]["pagination"]["page"], 2);
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .request("GET", "/api/admin/users?search=FROG103", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["users"][0]["telegramId"], "103");

    let (_, body) = app
        .request("GET", "/api/admin/users?filter=verified", Some(&admin), None)
        .await;
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (_, body) = app
        .request("GET", "/api/admin/users", Some(&admin), None)
        .await;
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users[0]["telegramId"], "104", "newest first");

    let (status, _) = app
        .request("GET", "/api/admin/users?limit=101", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Offset arithmetic would overflow for a page this large
    let (status, body) = app
        .request(
            "GET",
            "/api/admin/users?page=18446744073709551615&limit=100",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_referral_bonus_config() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .request("GET", "/api/admin/config", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["referralBonus"], 5);

    let (status, _) = app
        .request(
            "POST",
            "/api/admin/config",
            Some(&admin),
            Some(json!({ "referralBonus": -1, "premiumReferralBonus": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/config",
            Some(&admin),
            Some(json!({ "referralBonus": 10, "premiumReferralBonus": 20 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["premiumReferralBonus"], 20);

    let (referrer_token, referrer) = app.login(100, false, None, None).await;
    let code = referrer["specialId"].as_str().unwrap().to_string();
    app.login(200, false, Some(&code), None).await;

    let (_, body) = app
        .request("GET", "/api/user", Some(&referrer_token), None)
        .await;
    assert_eq!(body["data"]["user"]["stars"], 15);
}

#[tokio::test]
async fn test_join_channel() {
    let app = spawn_app().await;
    let (token, user) = app.login(100, false, None, None).await;
    assert_eq!(user["joinedChannel"], false);

    let (status, body) = app
        .request("POST", "/api/join-channel", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["joinedChannel"], true);

    let (_, body) = app.request("GET", "/api/user", Some(&token), None).await;
    assert_eq!(body["data"]["user"]["joinedChannel"], true);
}
