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

async fn publish_video<S>(app: &S, token: &str, title: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({
            "title": title,
            "description": "a description",
            "mediaRef": "videos/clip.mp4",
            "thumbnailRef": "thumbs/clip.png"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    read_json(resp).await["data"]["id"].as_str().unwrap().to_string()
}

async fn create_playlist<S>(app: &S, token: &str, name: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::post()
        .uri("/api/playlists")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "name": name, "description": "favorites" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    read_json(resp).await["data"]["id"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn test_create_playlist_requires_name() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "nameless").await;
    let req = test::TestRequest::post()
        .uri("/api/playlists")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "name": "  " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);
}

#[actix_web::test]
async fn test_add_and_remove_videos_keeps_order() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "curator").await;
    let playlist_id = create_playlist(&app, &token, "mix").await;
    let first = publish_video(&app, &token, "opening").await;
    let second = publish_video(&app, &token, "closing").await;

    for video in [&first, &second] {
        let req = test::TestRequest::patch()
            .uri(&format!("/api/playlists/add/{}/{}", video, playlist_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    let fetch = test::TestRequest::get()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .to_request();
    let body = read_json(test::call_service(&app, fetch).await).await;
    let videos = body["data"]["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0]["id"], first.as_str());
    assert_eq!(videos[1]["id"], second.as_str());

    let remove = test::TestRequest::patch()
        .uri(&format!("/api/playlists/remove/{}/{}", first, playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, remove).await.status(), 200);

    let fetch = test::TestRequest::get()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .to_request();
    let body = read_json(test::call_service(&app, fetch).await).await;
    let videos = body["data"]["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["id"], second.as_str());
}

#[actix_web::test]
async fn test_remove_drops_every_occurrence() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "repeater").await;
    let playlist_id = create_playlist(&app, &token, "loop").await;
    let video = publish_video(&app, &token, "again and again").await;

    // adding the same video twice is allowed
    for _ in 0..2 {
        let req = test::TestRequest::patch()
            .uri(&format!("/api/playlists/add/{}/{}", video, playlist_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    let fetch = test::TestRequest::get()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .to_request();
    let body = read_json(test::call_service(&app, fetch).await).await;
    assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 2);

    let remove = test::TestRequest::patch()
        .uri(&format!("/api/playlists/remove/{}/{}", video, playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, remove).await.status(), 200);

    let fetch = test::TestRequest::get()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .to_request();
    let body = read_json(test::call_service(&app, fetch).await).await;
    assert_eq!(body["data"]["videos"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn test_modifying_another_users_playlist_is_forbidden() {
    let app = setup_test_app().await;
    let (owner_token, _) = register_and_login(&app, "playlist_owner").await;
    let (other_token, _) = register_and_login(&app, "playlist_other").await;
    let playlist_id = create_playlist(&app, &owner_token, "private mix").await;
    let video = publish_video(&app, &other_token, "their video").await;

    let add = test::TestRequest::patch()
        .uri(&format!("/api/playlists/add/{}/{}", video, playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .to_request();
    assert_eq!(test::call_service(&app, add).await.status(), 403);

    let update = test::TestRequest::patch()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .set_json(json!({ "name": "hijacked" }))
        .to_request();
    assert_eq!(test::call_service(&app, update).await.status(), 403);

    let delete = test::TestRequest::delete()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", other_token)))
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), 403);
}

#[actix_web::test]
async fn test_update_fields_independently() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "renamer").await;
    let playlist_id = create_playlist(&app, &token, "old name").await;

    // no fields supplied
    let empty = test::TestRequest::patch()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, empty).await.status(), 400);

    // name only; description untouched
    let rename = test::TestRequest::patch()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(json!({ "name": "new name" }))
        .to_request();
    let body = read_json(test::call_service(&app, rename).await).await;
    assert_eq!(body["data"]["name"], "new name");
    assert_eq!(body["data"]["description"], "favorites");
}

#[actix_web::test]
async fn test_user_playlists_are_publicly_listable() {
    let app = setup_test_app().await;
    let (token, user_id) = register_and_login(&app, "public_curator").await;
    create_playlist(&app, &token, "one").await;
    create_playlist(&app, &token, "two").await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/playlists/user/{}", user_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body = read_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_deleted_playlist_is_gone() {
    let app = setup_test_app().await;
    let (token, _) = register_and_login(&app, "destroyer").await;
    let playlist_id = create_playlist(&app, &token, "short lived").await;

    let delete = test::TestRequest::delete()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    assert_eq!(test::call_service(&app, delete).await.status(), 200);

    let fetch = test::TestRequest::get()
        .uri(&format!("/api/playlists/{}", playlist_id))
        .to_request();
    assert_eq!(test::call_service(&app, fetch).await.status(), 404);
}
