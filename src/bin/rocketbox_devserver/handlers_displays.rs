use serde::Deserialize;

use super::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SwapRequest {
    source_chest_id: String,
    target_chest_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MoveToEmptyRequest {
    target_location: u32,
}

fn parse_id(raw: &str) -> Result<u64, Response> {
    raw.trim()
        .parse()
        .map_err(|_| bad_request("display ids are numbers"))
}

pub(super) async fn list_displays(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Json<Value> {
    let world = state.world.read().await;
    let rows = world.list(ListKind::Display, subject.member_id, OffsetDateTime::now_utc());
    data(Value::Array(rows))
}

pub(super) async fn display_detail(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, Response> {
    let world = state.world.read().await;
    world
        .detail(ListKind::Display, subject.member_id, id, OffsetDateTime::now_utc())
        .map(data)
        .map_err(reject)
}

pub(super) async fn swap_locations(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<SwapRequest>,
) -> Result<StatusCode, Response> {
    if state.reject_moves {
        return Err(conflict("the display cannot be rearranged right now"));
    }
    let source = parse_id(&payload.source_chest_id)?;
    let target = parse_id(&payload.target_chest_id)?;
    let mut world = state.world.write().await;
    world
        .swap(subject.member_id, source, target, OffsetDateTime::now_utc())
        .map_err(reject)?;
    tracing::info!(member = subject.member_id, source, target, "displays swapped");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn move_to_empty(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(id): Path<u64>,
    Json(payload): Json<MoveToEmptyRequest>,
) -> Result<StatusCode, Response> {
    if state.reject_moves {
        return Err(conflict("the display cannot be rearranged right now"));
    }
    let mut world = state.world.write().await;
    world
        .move_to_empty(
            subject.member_id,
            id,
            payload.target_location,
            OffsetDateTime::now_utc(),
        )
        .map_err(reject)?;
    tracing::info!(
        member = subject.member_id,
        display = id,
        location = payload.target_location,
        "display moved"
    );
    Ok(StatusCode::NO_CONTENT)
}
