use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use video_sharing_backend::auth::AuthConfig;
use video_sharing_backend::handlers;
use video_sharing_backend::store::MemStore;
use video_sharing_backend::AppState;

async fn setup_test_app() -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    let app_state = web::Data::new(AppState {
        store: Arc::new(MemStore::new()),
        auth: AuthConfig::from_env(),
    });
    test::init_service(
        App::new()
            .app_data(app_state)
            .configure(handlers::configure_routes),
    )
    .await
}

async fn read_json(resp: actix_web::dev::ServiceResponse) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap()
}

async fn register_and_login<S>(app: &S, username: &str) -> (String, String)
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let register = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({
            "username": username,
            "fullName": "Test User",
            "email": format!("{}@example.com", username),
            "password": "password123",
            "avatar": "https://cdn.example.com/avatar.png"
        }))
        .to_request();
    assert_eq!(test::call_service(app, register).await.status(), 201);

    let login = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "username": username, "password": "password123" }))
        .to_request();
    let body = read_json(test::call_service(app, login).await).await;
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

async fn toggle_subscription<S>(app: &S, token: &str, channel_id: &str) -> bool
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::post()
        .uri(&format!("/api/subscriptions/toggle/{}", channel_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200);
    read_json(resp).await["data"]["isSubscribed"].as_bool().unwrap()
}

#[actix_web::test]
async fn test_toggle_twice_restores_unsubscribed_state() {
    let app = setup_test_app().await;
    let (fan_token, _) = register_and_login(&app, "fan").await;
    let (_, channel_id) = register_and_login(&app, "channel").await;

    assert!(toggle_subscription(&app, &fan_token, &channel_id).await);
    assert!(!toggle_subscription(&app, &fan_token, &channel_id).await);

    let req = test::TestRequest::get()
        .uri(&format!("/api/subscriptions/channel/{}", channel_id))
        .to_request();
    let body = read_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn test_subscriber_and_channel_listings() {
    let app = setup_test_app().await;
    let (fan_a_token, fan_a_id) = register_and_login(&app, "fan_a").await;
    let (fan_b_token, _) = register_and_login(&app, "fan_b").await;
    let (_, channel_id) = register_and_login(&app, "star").await;

    assert!(toggle_subscription(&app, &fan_a_token, &channel_id).await);
    assert!(toggle_subscription(&app, &fan_b_token, &channel_id).await);

    let subscribers = test::TestRequest::get()
        .uri(&format!("/api/subscriptions/channel/{}", channel_id))
        .to_request();
    let body = read_json(test::call_service(&app, subscribers).await).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"fan_a"));
    assert!(names.contains(&"fan_b"));

    let channels = test::TestRequest::get()
        .uri(&format!("/api/subscriptions/user/{}", fan_a_id))
        .to_request();
    let body = read_json(test::call_service(&app, channels).await).await;
    let channels = body["data"].as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["username"], "star");
}

#[actix_web::test]
async fn test_channel_profile_reflects_subscription() {
    let app = setup_test_app().await;
    let (fan_token, _) = register_and_login(&app, "devotee").await;
    register_and_login(&app, "idol").await;

    let profile = test::TestRequest::get()
        .uri("/api/users/channel/idol")
        .insert_header(("Authorization", format!("Bearer {}", fan_token)))
        .to_request();
    let body = read_json(test::call_service(&app, profile).await).await;
    assert_eq!(body["data"]["subscriberCount"], 0);
    assert_eq!(body["data"]["isSubscribed"], false);
    let channel_id = body["data"]["id"].as_str().unwrap().to_string();

    assert!(toggle_subscription(&app, &fan_token, &channel_id).await);

    let profile = test::TestRequest::get()
        .uri("/api/users/channel/idol")
        .insert_header(("Authorization", format!("Bearer {}", fan_token)))
        .to_request();
    let body = read_json(test::call_service(&app, profile).await).await;
    assert_eq!(body["data"]["subscriberCount"], 1);
    assert_eq!(body["data"]["isSubscribed"], true);

    // anonymous viewers see the count but never a subscription flag
    let anonymous = test::TestRequest::get()
        .uri("/api/users/channel/idol")
        .to_request();
    let body = read_json(test::call_service(&app, anonymous).await).await;
    assert_eq!(body["data"]["subscriberCount"], 1);
    assert_eq!(body["data"]["isSubscribed"], false);
}

#[actix_web::test]
async fn test_subscribing_to_missing_channel_is_not_found() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "nobody_fan").await;
    let req = test::TestRequest::post()
        .uri(&format!("/api/subscriptions/toggle/{}", uuid::Uuid::new_v4()))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn test_self_subscription_is_allowed() {
    let app = setup_test_app().await;
    let (token, user_id) = register_and_login(&app, "self_promoter").await;
    assert!(toggle_subscription(&app, &token, &user_id).await);

    let profile = test::TestRequest::get()
        .uri("/api/users/channel/self_promoter")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let body = read_json(test::call_service(&app, profile).await).await;
    assert_eq!(body["data"]["subscriberCount"], 1);
    assert_eq!(body["data"]["isSubscribed"], true);
}
