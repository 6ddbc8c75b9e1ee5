use axum::{
    extract::{FromRef, Path, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    auth::jwt::JwtKeys,
    error::ApiError,
    oauth::resolver,
    state::AppState,
    users::repo_types::Provider,
};

pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/:provider", get(begin))
        .route("/auth/:provider/callback", get(callback))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
}

fn parse_provider(raw: &str) -> Result<Provider, ApiError> {
    Provider::parse(raw).ok_or_else(|| ApiError::NotFound(format!("Unknown OAuth provider: {raw}")))
}

#[instrument(skip(state))]
pub async fn begin(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, ApiError> {
    let provider = parse_provider(&provider)?;
    let (url, _csrf) = state.oauth.authorize_url(provider)?;
    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, params))]
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, ApiError> {
    let provider = parse_provider(&provider)?;

    let profile = state.oauth.exchange(provider, &params.code).await?;
    let user = resolver::resolve(&state.db, provider, &profile).await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, provider = provider.as_str(), "oauth sign-in");

    // Hands the token to the front-end as query parameters; kept for
    // compatibility with the existing oauth-redirect page.
    let redirect = format!(
        "{}/oauth-redirect?token={}&userId={}",
        state.config.frontend_url, token, user.id
    );
    Ok(Redirect::temporary(&redirect))
}
