// HTTP API 层
//
// 路由只做参数解析和错误映射，业务逻辑交给 ChatModule

pub mod chat;
pub mod session;

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::infrastructure::AppState;
use crate::shared::AppResult;

/// 构建应用路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat/message", post(chat::chat_send_message))
        .route("/api/chat/providers", get(chat::chat_list_providers))
        .route(
            "/api/chat/sessions",
            get(session::session_list).post(session::session_create),
        )
        .route(
            "/api/chat/sessions/{id}",
            get(session::session_get)
                .patch(session::session_rename)
                .delete(session::session_delete),
        )
        .route(
            "/api/chat/sessions/{id}/regenerate",
            post(chat::chat_regenerate),
        )
        .route(
            "/api/chat/sessions/{id}/stop",
            post(chat::chat_stop_generation),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 请求体可以省略；缺少 JSON Content-Type 时使用默认值
pub(crate) fn optional_json<T: Default>(
    payload: Result<Json<T>, JsonRejection>,
) -> AppResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}
