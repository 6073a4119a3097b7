// Session Commands
//
// 使用 ChatModule 的 CQRS 命令和查询处理会话操作

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::optional_json;
use crate::infrastructure::AppState;
use crate::modules::chat::{
    CreateSessionCommand, DeleteSessionCommand, GetSessionQuery, ListSessionsQuery, Session,
    SessionDetail, SessionSummary, UpdateSessionCommand,
};
use crate::shared::{parse_session_id, AppResult};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSessionRequest {
    pub title: String,
}

/// 创建会话
pub async fn session_create(
    State(state): State<AppState>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let request = optional_json(payload)?;

    let response = state
        .chat
        .create_session(CreateSessionCommand::new(request.title))
        .await?;

    Ok((StatusCode::CREATED, Json(response.session)))
}

/// 分页列出会话，最近更新的在前
pub async fn session_list(
    State(state): State<AppState>,
    params: Result<Query<ListSessionsParams>, QueryRejection>,
) -> AppResult<Json<ListSessionsResponse>> {
    let Query(params) = params?;
    let defaults = ListSessionsQuery::default();
    let query = ListSessionsQuery::new(
        params.page.unwrap_or(defaults.page),
        params.limit.unwrap_or(defaults.limit),
    );

    let response = state.chat.list_sessions(query).await?;

    Ok(Json(ListSessionsResponse {
        sessions: response.sessions,
        total: response.total,
        page: response.page,
        limit: response.limit,
        has_more: response.has_more,
    }))
}

/// 获取会话及其消息
pub async fn session_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SessionDetail>> {
    let session_id = parse_session_id(&id)?;
    let detail = state.chat.get_session(GetSessionQuery::new(session_id)).await?;
    Ok(Json(detail))
}

/// 重命名会话
pub async fn session_rename(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RenameSessionRequest>, JsonRejection>,
) -> AppResult<Json<Session>> {
    let session_id = parse_session_id(&id)?;
    let Json(request) = payload?;

    let response = state
        .chat
        .update_session(UpdateSessionCommand::new(session_id, request.title))
        .await?;

    Ok(Json(response.session))
}

/// 删除会话（幂等）
pub async fn session_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let session_id = parse_session_id(&id)?;

    let response = state
        .chat
        .delete_session(DeleteSessionCommand::new(session_id))
        .await?;
    tracing::info!(
        "[session_delete] session={} deleted_messages={}",
        session_id,
        response.deleted_messages
    );

    Ok(StatusCode::NO_CONTENT)
}
