use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers::{redirect_tracked, RedirectState};

pub fn create_redirect_router(state: Arc<RedirectState>) -> Router {
    Router::new()
        .route("/t/{code}", get(redirect_tracked))
        .with_state(state)
}
