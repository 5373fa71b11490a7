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

async fn create_tweet<S>(app: &S, token: &str, content: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::post()
        .uri("/api/tweets")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "content": content }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    read_json(resp).await["data"]["id"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn test_create_and_list_tweets() {
    let app = setup_test_app().await;
    let (token, user_id) = register_and_login(&app, "micro_blogger").await;
    create_tweet(&app, &token, "hello world").await;
    create_tweet(&app, &token, "second thought").await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/tweets/user/{}", user_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body = read_json(resp).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // newest first, with owner card and like fields
    assert_eq!(items[0]["content"], "second thought");
    assert_eq!(items[0]["owner"]["username"], "micro_blogger");
    assert_eq!(items[0]["likesCount"], 0);
    assert_eq!(items[0]["isLiked"], false);
}

#[actix_web::test]
async fn test_blank_tweet_is_rejected() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "quiet").await;
    let req = test::TestRequest::post()
        .uri("/api/tweets")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "content": "  " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn test_tweets_of_missing_user_are_not_found() {
    let app = setup_test_app().await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/tweets/user/{}", uuid::Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn test_update_own_tweet() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "reviser").await;
    let tweet_id = create_tweet(&app, &token, "draft").await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/tweets/{}", tweet_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "content": "final" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(read_json(resp).await["data"]["content"], "final");
}

#[actix_web::test]
async fn test_updating_someone_elses_tweet_is_forbidden() {
    let app = setup_test_app().await;
    let (author_token, author_id) = register_and_login(&app, "tweet_author").await;
    let (other_token, _) = register_and_login(&app, "tweet_other").await;
    let tweet_id = create_tweet(&app, &author_token, "mine").await;

    let update = test::TestRequest::patch()
        .uri(&format!("/api/tweets/{}", tweet_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .set_json(json!({ "content": "stolen" }))
        .to_request();
    assert_eq!(test::call_service(&app, update).await.status(), 403);

    let delete = test::TestRequest::delete()
        .uri(&format!("/api/tweets/{}", tweet_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), 403);

    let list = test::TestRequest::get()
        .uri(&format!("/api/tweets/user/{}", author_id))
        .to_request();
    let body = read_json(test::call_service(&app, list).await).await;
    assert_eq!(body["data"][0]["content"], "mine");
}

#[actix_web::test]
async fn test_delete_tweet_removes_its_likes() {
    let app = setup_test_app().await;
    let (token, user_id) = register_and_login(&app, "fleeting").await;
    let tweet_id = create_tweet(&app, &token, "gone soon").await;

    let like = test::TestRequest::post()
        .uri(&format!("/api/likes/toggle/tweet/{}", tweet_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, like).await.status(), 200);

    let delete = test::TestRequest::delete()
        .uri(&format!("/api/tweets/{}", tweet_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), 200);

    let list = test::TestRequest::get()
        .uri(&format!("/api/tweets/user/{}", user_id))
        .to_request();
    let body = read_json(test::call_service(&app, list).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let like_again = test::TestRequest::post()
        .uri(&format!("/api/likes/toggle/tweet/{}", tweet_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, like_again).await.status(), 404);
}
