use std::sync::Arc;

pub mod auth;
pub mod error;
pub mod handlers;
pub mod models;
pub mod ownership;
pub mod pagination;
pub mod response;
pub mod store;
pub mod views;

use crate::auth::AuthConfig;
use crate::store::Store;

/// Shared per-app state: the store handle is constructed at startup and
/// injected here rather than reached through a global.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthConfig,
}
