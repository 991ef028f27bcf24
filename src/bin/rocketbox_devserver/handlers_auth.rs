use serde::Deserialize;

use super::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshRequest {
    refresh_token: String,
}

fn token_body(pair: TokenPair) -> Json<Value> {
    Json(json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    }))
}

fn token_failure(err: anyhow::Error) -> Response {
    tracing::warn!(error = %format!("{:#}", err), "could not issue tokens");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": err.to_string()})),
    )
        .into_response()
}

pub(super) async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, Response> {
    let mut world = state.world.write().await;
    match world.login(
        &payload.email,
        &payload.password,
        state.access_ttl,
        OffsetDateTime::now_utc(),
    ) {
        Ok(Some(pair)) => {
            tracing::info!(email = %payload.email, "member logged in");
            Ok(token_body(pair))
        }
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "wrong email or password"})),
        )
            .into_response()),
        Err(err) => Err(token_failure(err)),
    }
}

pub(super) async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<Value>, Response> {
    let mut world = state.world.write().await;
    match world.refresh(
        &payload.refresh_token,
        state.access_ttl,
        OffsetDateTime::now_utc(),
    ) {
        Ok(Some(pair)) => {
            tracing::debug!("tokens rotated");
            Ok(token_body(pair))
        }
        Ok(None) => Err(unauthorized()),
        Err(err) => Err(token_failure(err)),
    }
}

pub(super) async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> StatusCode {
    state.world.write().await.logout(subject.member_id);
    tracing::info!(member = subject.member_id, "member logged out");
    StatusCode::NO_CONTENT
}

pub(super) async fn me(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Result<Json<Value>, Response> {
    let world = state.world.read().await;
    world
        .profile(subject.member_id)
        .map(Json)
        .ok_or_else(not_found)
}
