use actix_web::cookie::Cookie;
use actix_web::{get, patch, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{self, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::error::ApiError;
use crate::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest,
    TokenPair, UpdateAvatarRequest, UpdateCoverImageRequest, UpdateDetailsRequest, User,
    UserPublic,
};
use crate::response;
use crate::views;
use crate::AppState;

fn auth_cookie(name: &str, value: &str) -> Cookie<'static> {
    Cookie::build(name.to_owned(), value.to_owned())
        .path("/")
        .http_only(true)
        .finish()
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(name.to_owned(), "").path("/").finish()
}

fn attach_token_cookies(
    resp: &mut HttpResponse,
    access_token: &str,
    refresh_value: &str,
) -> Result<(), ApiError> {
    resp.add_cookie(&auth_cookie(ACCESS_COOKIE, access_token))
        .and_then(|_| resp.add_cookie(&auth_cookie(REFRESH_COOKIE, refresh_value)))
        .map_err(|e| ApiError::internal(format!("failed to set auth cookies: {}", e)))
}

/// Issue a fresh access/refresh pair and persist the refresh token on the
/// user record; the previously stored refresh token stops being accepted.
async fn rotate_tokens(state: &AppState, user: &User) -> Result<(String, String), ApiError> {
    let access_token = auth::issue_access_token(&state.auth, user)?;
    let refresh_value = auth::issue_refresh_token(&state.auth, user.id)?;
    let mut updated = user.clone();
    updated.refresh_token = Some(refresh_value.clone());
    state.store.update_user(&updated).await?;
    Ok((access_token, refresh_value))
}

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    let required = [&req.username, &req.full_name, &req.email, &req.password];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::bad_request("all fields are required"));
    }
    if req.avatar.trim().is_empty() {
        return Err(ApiError::bad_request("avatar is required"));
    }

    let store = state.store.as_ref();
    if store.user_by_username(&req.username).await?.is_some()
        || store.user_by_email(&req.email).await?.is_some()
    {
        return Err(ApiError::conflict("user already exists"));
    }

    let user = User {
        id: Uuid::new_v4(),
        username: req.username.trim().to_lowercase(),
        email: req.email.trim().to_string(),
        full_name: req.full_name.trim().to_string(),
        avatar: req.avatar,
        cover_image: req.cover_image.filter(|c| !c.trim().is_empty()),
        password: auth::hash_password(&req.password)?,
        refresh_token: None,
        watch_history: Vec::new(),
        created_at: Utc::now().naive_utc(),
    };
    store.insert_user(&user).await?;
    info!("registered user {}", user.username);

    Ok(response::created(
        UserPublic::from(&user),
        "User registered successfully",
    ))
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    if req.username.trim().is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }

    let user = state
        .store
        .user_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if !auth::verify_password(&req.password, &user.password) {
        return Err(ApiError::unauthorized("invalid user credentials"));
    }

    let (access_token, refresh_value) = rotate_tokens(&state, &user).await?;
    info!("user {} logged in", user.username);

    let mut resp = response::ok(
        LoginResponse {
            user: UserPublic::from(&user),
            access_token: access_token.clone(),
            refresh_token: refresh_value.clone(),
        },
        "User logged in successfully",
    );
    attach_token_cookies(&mut resp, &access_token, &refresh_value)?;
    Ok(resp)
}

#[post("/logout")]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    if let Some(user) = state.store.user_by_id(claims.sub).await? {
        let mut updated = user;
        updated.refresh_token = None;
        state.store.update_user(&updated).await?;
    }

    let mut resp = response::ok(json!({}), "User logged out");
    let _ = resp.add_removal_cookie(&removal_cookie(ACCESS_COOKIE));
    let _ = resp.add_removal_cookie(&removal_cookie(REFRESH_COOKIE));
    Ok(resp)
}

#[post("/refresh-token")]
pub async fn refresh_token(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
) -> Result<HttpResponse, ApiError> {
    let body = body
        .map(|b| b.into_inner())
        .unwrap_or(RefreshRequest { refresh_token: None });
    let presented = auth::refresh_token_from_request(&req, &body)
        .ok_or_else(|| ApiError::unauthorized("unauthorized request"))?;

    let claims = auth::decode_refresh_token(&state.auth, &presented)?;
    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid refresh token"))?;

    // Reuse of an already-rotated token means the credential was revoked.
    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        return Err(ApiError::unauthorized("refresh token has been revoked"));
    }

    let (access_token, refresh_value) = rotate_tokens(&state, &user).await?;
    let mut resp = response::ok(
        TokenPair {
            access_token: access_token.clone(),
            refresh_token: refresh_value.clone(),
        },
        "Access token refreshed",
    );
    attach_token_cookies(&mut resp, &access_token, &refresh_value)?;
    Ok(resp)
}

#[post("/change-password")]
pub async fn change_password(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let body = body.into_inner();
    if body.new_password.trim().is_empty() {
        return Err(ApiError::bad_request("new password is required"));
    }

    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    if !auth::verify_password(&body.old_password, &user.password) {
        return Err(ApiError::bad_request("invalid password"));
    }

    let mut updated = user;
    updated.password = auth::hash_password(&body.new_password)?;
    state.store.update_user(&updated).await?;
    Ok(response::ok(json!({}), "Password changed successfully"))
}

#[get("/current-user")]
pub async fn current_user(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(response::ok(UserPublic::from(&user), "Current user fetched"))
}

#[patch("/update-details")]
pub async fn update_details(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateDetailsRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let body = body.into_inner();
    if body.full_name.is_none() && body.email.is_none() {
        return Err(ApiError::bad_request("nothing to update"));
    }

    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let mut updated = user;

    if let Some(full_name) = body.full_name {
        if full_name.trim().is_empty() {
            return Err(ApiError::bad_request("full name cannot be blank"));
        }
        updated.full_name = full_name.trim().to_string();
    }
    if let Some(email) = body.email {
        if email.trim().is_empty() {
            return Err(ApiError::bad_request("email cannot be blank"));
        }
        if let Some(other) = state.store.user_by_email(email.trim()).await? {
            if other.id != updated.id {
                return Err(ApiError::conflict("email already in use"));
            }
        }
        updated.email = email.trim().to_string();
    }

    state.store.update_user(&updated).await?;
    Ok(response::ok(
        UserPublic::from(&updated),
        "Account details updated",
    ))
}

#[patch("/update-avatar")]
pub async fn update_avatar(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateAvatarRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let body = body.into_inner();
    if body.avatar.trim().is_empty() {
        return Err(ApiError::bad_request("avatar is required"));
    }

    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let mut updated = user;
    updated.avatar = body.avatar;
    state.store.update_user(&updated).await?;
    Ok(response::ok(
        UserPublic::from(&updated),
        "Avatar updated successfully",
    ))
}

#[patch("/update-coverimage")]
pub async fn update_cover_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateCoverImageRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let body = body.into_inner();
    if body.cover_image.trim().is_empty() {
        return Err(ApiError::bad_request("cover image is required"));
    }

    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let mut updated = user;
    updated.cover_image = Some(body.cover_image);
    state.store.update_user(&updated).await?;
    Ok(response::ok(
        UserPublic::from(&updated),
        "Cover image updated successfully",
    ))
}

#[get("/channel/{username}")]
pub async fn user_channel(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    if username.trim().is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }
    let viewer = auth::authenticate_opt(&req, &state.auth).map(|c| c.sub);

    let channel = state
        .store
        .user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("channel does not exist"))?;
    let profile = views::channel_profile(state.store.as_ref(), &channel, viewer).await?;
    Ok(response::ok(profile, "User channel fetched"))
}

#[get("/history")]
pub async fn watch_history(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    let history = views::watch_history(state.store.as_ref(), &user).await?;
    Ok(response::ok(history, "Watch history fetched"))
}
