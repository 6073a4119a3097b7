// Chat Commands
//
// 聊天相关的 HTTP 处理器，业务逻辑全部交给 ChatModule

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::optional_json;
use crate::infrastructure::AppState;
use crate::modules::chat::{
    Message, MessageId, ProviderInfo, RegenerateCommand, SendMessageCommand, SendMessageResponse,
    SessionId, StopGenerationCommand,
};
use crate::shared::{parse_session_id, AppResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(alias = "message")]
    pub content: String,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// 一轮对话的回复
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: Message,
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message_id: Option<MessageId>,
}

impl From<SendMessageResponse> for ChatReply {
    fn from(response: SendMessageResponse) -> Self {
        Self {
            message: response.message,
            session_id: response.session_id,
            user_message_id: response.user_message_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopGenerationResponse {
    pub cancelled: bool,
}

/// 发送消息
pub async fn chat_send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> AppResult<Json<ChatReply>> {
    let Json(request) = payload?;
    tracing::info!(
        "[chat_send_message] session={:?} model={:?}",
        request.session_id,
        request.model
    );

    let mut command = SendMessageCommand::new(request.content)
        .with_model(request.model)
        .with_timeout(request.timeout_secs.map(Duration::from_secs));
    if let Some(session_id) = request.session_id {
        command = command.in_session(session_id);
    }

    let response = state.chat.send_message(command).await?;
    Ok(Json(response.into()))
}

/// 重新生成回复（不创建新的用户消息）
pub async fn chat_regenerate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RegenerateRequest>, JsonRejection>,
) -> AppResult<Json<ChatReply>> {
    let session_id = parse_session_id(&id)?;
    let request = optional_json(payload)?;
    tracing::info!("[chat_regenerate] Regenerating for session: {}", session_id);

    let command = RegenerateCommand::new(
        session_id,
        request.model,
        request.timeout_secs.map(Duration::from_secs),
    );
    let response = state.chat.regenerate(command).await?;
    Ok(Json(response.into()))
}

/// 停止生成
pub async fn chat_stop_generation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<StopGenerationResponse>> {
    let session_id = parse_session_id(&id)?;

    let response = state
        .chat
        .stop_generation(StopGenerationCommand::new(session_id))
        .await?;

    Ok(Json(StopGenerationResponse {
        cancelled: response.cancelled,
    }))
}

/// 列出已配置的提供商
pub async fn chat_list_providers(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProviderInfo>>> {
    Ok(Json(state.chat.list_providers().await?))
}
