use super::*;

async fn list_for(state: &AppState, subject: &Subject, kind: ListKind) -> Json<Value> {
    let world = state.world.read().await;
    let rows = world.list(kind, subject.member_id, OffsetDateTime::now_utc());
    data(Value::Array(rows))
}

async fn detail_for(
    state: &AppState,
    subject: &Subject,
    kind: ListKind,
    id: u64,
) -> Result<Json<Value>, Response> {
    let world = state.world.read().await;
    world
        .detail(kind, subject.member_id, id, OffsetDateTime::now_utc())
        .map(data)
        .map_err(reject)
}

pub(super) async fn list_own(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Json<Value> {
    list_for(&state, &subject, ListKind::Own).await
}

pub(super) async fn list_received(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Json<Value> {
    list_for(&state, &subject, ListKind::Received).await
}

pub(super) async fn list_sent(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Json<Value> {
    list_for(&state, &subject, ListKind::Sent).await
}

pub(super) async fn list_group(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Json<Value> {
    list_for(&state, &subject, ListKind::Group).await
}

pub(super) async fn own_detail(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, Response> {
    detail_for(&state, &subject, ListKind::Own, id).await
}

pub(super) async fn received_detail(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, Response> {
    detail_for(&state, &subject, ListKind::Received, id).await
}

pub(super) async fn sent_detail(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, Response> {
    detail_for(&state, &subject, ListKind::Sent, id).await
}

pub(super) async fn group_detail(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, Response> {
    detail_for(&state, &subject, ListKind::Group, id).await
}

pub(super) async fn unlock_rocket(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<StatusCode, Response> {
    let mut world = state.world.write().await;
    world
        .unlock(subject.member_id, id, OffsetDateTime::now_utc())
        .map_err(reject)?;
    tracing::info!(member = subject.member_id, rocket = id, "rocket unlocked");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn toggle_visibility(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, Response> {
    let mut world = state.world.write().await;
    let is_public = world
        .toggle_visibility(subject.member_id, id, OffsetDateTime::now_utc())
        .map_err(reject)?;
    tracing::info!(member = subject.member_id, chest = id, is_public, "visibility toggled");
    Ok(Json(json!({ "isPublic": is_public })))
}

pub(super) async fn download_file(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<Response, Response> {
    let world = state.world.read().await;
    let (name, bytes) = world
        .file(subject.member_id, id, OffsetDateTime::now_utc())
        .map_err(reject)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        axum::body::Bytes::from(bytes),
    )
        .into_response())
}
