use super::*;

pub(super) fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized"})),
    )
        .into_response()
}

pub(super) fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"message": msg}))).into_response()
}

pub(super) fn forbidden(msg: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({"message": msg}))).into_response()
}

pub(super) fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "not found"})),
    )
        .into_response()
}

pub(super) fn conflict(msg: &str) -> Response {
    (StatusCode::CONFLICT, Json(json!({"message": msg}))).into_response()
}

/// Maps a world rule violation onto its HTTP status.
pub(super) fn reject(err: Refusal) -> Response {
    match err {
        Refusal::NotFound => not_found(),
        Refusal::Forbidden(msg) => forbidden(msg),
        Refusal::Conflict(msg) => conflict(msg),
        Refusal::BadRequest(msg) => bad_request(msg),
    }
}

pub(super) fn data(value: Value) -> Json<Value> {
    Json(json!({ "data": value }))
}
