// 对话调度器
//
// 单轮状态机：
// START -> SESSION_RESOLVED -> USER_MESSAGE_APPENDED -> PROVIDER_RESOLVED
//       -> REPLY_GENERATED -> PERSISTED
// 任一步失败即终止，错误中记录失败所在的阶段。
// 成功时恰好追加一条助手消息，失败时不追加。

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::session_store::SessionStore;
use super::turns::{ActiveTurn, TurnCoordinator};
use super::ApplicationError;
use crate::modules::chat::domain::{
    metadata_keys, ContextBuilder, Message, MessageId, MessageRole, SessionId,
    DEFAULT_SESSION_TITLE,
};
use crate::modules::chat::ports::{
    CompletionRequest, ProviderError, ProviderErrorKind, ProviderResolver, RepositoryError,
    ResolveError, ResolvedProvider,
};

/// 调度器配置
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub default_model: String,
    pub default_title: String,
    pub provider_timeout: Duration,
    pub system_prompt: Option<String>,
    pub max_history_messages: Option<usize>,
    pub temperature: Option<f32>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_model: "gpt-3.5-turbo".to_string(),
            default_title: DEFAULT_SESSION_TITLE.to_string(),
            provider_timeout: Duration::from_secs(60),
            system_prompt: None,
            max_history_messages: None,
            temperature: None,
        }
    }
}

/// 轮次阶段，失败时表示正在尝试到达的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnStage {
    Start,
    SessionResolved,
    UserMessageAppended,
    ProviderResolved,
    ReplyGenerated,
    Persisted,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnStage::Start => "START",
            TurnStage::SessionResolved => "SESSION_RESOLVED",
            TurnStage::UserMessageAppended => "USER_MESSAGE_APPENDED",
            TurnStage::ProviderResolved => "PROVIDER_RESOLVED",
            TurnStage::ReplyGenerated => "REPLY_GENERATED",
            TurnStage::Persisted => "PERSISTED",
        };
        f.write_str(s)
    }
}

/// 模型不可用的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UnsupportedReason {
    /// 没有提供商声明该模型前缀
    UnknownModel,
    /// 提供商已配置但缺少凭证
    MissingCredential { provider: String },
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsupportedReason::UnknownModel => f.write_str("no provider serves this model"),
            UnsupportedReason::MissingCredential { provider } => {
                write!(f, "provider '{}' has no credential configured", provider)
            }
        }
    }
}

/// 轮次失败类别
#[derive(Debug, Error)]
pub enum DispatchErrorKind {
    #[error("Session not found")]
    NotFound,

    #[error("Unsupported model '{model}': {reason}")]
    UnsupportedModel {
        model: String,
        reason: UnsupportedReason,
    },

    #[error(transparent)]
    Provider(ProviderError),

    #[error("Storage error: {0}")]
    Storage(RepositoryError),

    #[error("Turn was cancelled")]
    Cancelled,
}

impl From<ResolveError> for DispatchErrorKind {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UnknownModel(model) => DispatchErrorKind::UnsupportedModel {
                model,
                reason: UnsupportedReason::UnknownModel,
            },
            ResolveError::MissingCredential { model, provider } => {
                DispatchErrorKind::UnsupportedModel {
                    model,
                    reason: UnsupportedReason::MissingCredential { provider },
                }
            }
        }
    }
}

impl From<RepositoryError> for DispatchErrorKind {
    fn from(e: RepositoryError) -> Self {
        match e {
            // 会话在轮次进行中被删除
            RepositoryError::NotFound(_) => DispatchErrorKind::NotFound,
            other => DispatchErrorKind::Storage(other),
        }
    }
}

/// 轮次失败
///
/// 携带失败阶段、会话 ID 和已追加的用户消息 ID，
/// 客户端可以换一个模型调用 regenerate 而无需重新提交文本
#[derive(Debug, Error)]
#[error("Turn failed at {stage}: {kind}")]
pub struct DispatchError {
    pub stage: TurnStage,
    pub session_id: Option<SessionId>,
    pub user_message_id: Option<MessageId>,
    #[source]
    pub kind: DispatchErrorKind,
}

impl DispatchError {
    pub fn provider_error_kind(&self) -> Option<ProviderErrorKind> {
        match &self.kind {
            DispatchErrorKind::Provider(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// 轮次上下文，用于给错误补全阶段信息
struct TurnContext {
    stage: TurnStage,
    session_id: Option<SessionId>,
    user_message_id: Option<MessageId>,
}

impl TurnContext {
    fn new(session_id: Option<SessionId>) -> Self {
        Self {
            stage: TurnStage::Start,
            session_id,
            user_message_id: None,
        }
    }

    fn fail(&self, failed_at: TurnStage, kind: impl Into<DispatchErrorKind>) -> DispatchError {
        DispatchError {
            stage: failed_at,
            session_id: self.session_id,
            user_message_id: self.user_message_id,
            kind: kind.into(),
        }
    }

    fn advance(&mut self, stage: TurnStage) {
        debug!("[dispatch] {} -> {}", self.stage, stage);
        self.stage = stage;
    }
}

/// 一轮成功的结果
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    pub user_message_id: Option<MessageId>,
    pub message: Message,
}

/// 对话调度器
pub struct Dispatcher {
    store: Arc<SessionStore>,
    resolver: Arc<dyn ProviderResolver>,
    turns: Arc<TurnCoordinator>,
    settings: ChatSettings,
    context_builder: ContextBuilder,
}

impl Dispatcher {
    pub fn new(
        store: Arc<SessionStore>,
        resolver: Arc<dyn ProviderResolver>,
        turns: Arc<TurnCoordinator>,
        settings: ChatSettings,
    ) -> Self {
        let mut context_builder = ContextBuilder::new();
        if let Some(max) = settings.max_history_messages {
            context_builder = context_builder.with_max_messages(max);
        }
        if let Some(prompt) = &settings.system_prompt {
            context_builder = context_builder.with_system_prompt(prompt.clone());
        }

        Self {
            store,
            resolver,
            turns,
            settings,
            context_builder,
        }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// 发送一条用户消息并生成回复
    pub async fn send_message(
        &self,
        content: &str,
        session_id: Option<SessionId>,
        model: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<TurnOutcome, ApplicationError> {
        if content.trim().is_empty() {
            return Err(ApplicationError::ValidationError(
                "Message content must not be empty".to_string(),
            ));
        }
        let timeout = self.effective_timeout(timeout)?;
        let mut ctx = TurnContext::new(session_id);

        // 1. 解析会话
        let (session_id, _lock) = match session_id {
            Some(id) => {
                let lock = self.turns.lock(id).await;
                let exists = self
                    .store
                    .get(id)
                    .await
                    .map_err(|e| ctx.fail(TurnStage::SessionResolved, e))?
                    .is_some();
                if !exists {
                    return Err(ctx
                        .fail(TurnStage::SessionResolved, DispatchErrorKind::NotFound)
                        .into());
                }
                (id, lock)
            }
            None => {
                let session = self
                    .store
                    .create(Some(self.settings.default_title.clone()))
                    .await
                    .map_err(|e| ctx.fail(TurnStage::SessionResolved, e))?;
                ctx.session_id = Some(session.id());
                (session.id(), self.turns.lock(session.id()).await)
            }
        };
        ctx.advance(TurnStage::SessionResolved);
        let active = self.turns.begin(session_id);

        // 2. 追加用户消息
        let user_message = self
            .store
            .append(Message::new_user(session_id, content))
            .await
            .map_err(|e| ctx.fail(TurnStage::UserMessageAppended, e))?;
        ctx.user_message_id = Some(user_message.id());
        ctx.advance(TurnStage::UserMessageAppended);

        info!(
            "[send_message] session={} user_message={}",
            session_id,
            user_message.id()
        );

        // 3-5
        self.complete_turn(&mut ctx, session_id, model, timeout, &active)
            .await
    }

    /// 为会话末尾待回复的用户消息重新生成回复
    pub async fn regenerate(
        &self,
        session_id: SessionId,
        model: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<TurnOutcome, ApplicationError> {
        let timeout = self.effective_timeout(timeout)?;
        let mut ctx = TurnContext::new(Some(session_id));

        let _lock = self.turns.lock(session_id).await;
        if self
            .store
            .get(session_id)
            .await
            .map_err(|e| ctx.fail(TurnStage::SessionResolved, e))?
            .is_none()
        {
            return Err(ctx
                .fail(TurnStage::SessionResolved, DispatchErrorKind::NotFound)
                .into());
        }
        ctx.advance(TurnStage::SessionResolved);

        let last = self
            .store
            .last_message(session_id)
            .await
            .map_err(|e| ctx.fail(TurnStage::UserMessageAppended, e))?;
        let pending = match last {
            Some(message) if message.role() == MessageRole::User => message,
            _ => {
                return Err(ApplicationError::ValidationError(
                    "Session has no pending user message to answer".to_string(),
                ))
            }
        };
        ctx.user_message_id = Some(pending.id());
        ctx.advance(TurnStage::UserMessageAppended);

        info!(
            "[regenerate] session={} pending_message={}",
            session_id,
            pending.id()
        );

        let active = self.turns.begin(session_id);
        self.complete_turn(&mut ctx, session_id, model, timeout, &active)
            .await
    }

    /// 取消会话上正在执行的轮次
    pub fn stop(&self, session_id: SessionId) -> bool {
        let cancelled = self.turns.cancel(session_id);
        if cancelled {
            info!("[stop] Cancellation requested for session {}", session_id);
        }
        cancelled
    }

    /// 阶段 3 到 5：解析提供商、生成回复、持久化
    async fn complete_turn(
        &self,
        ctx: &mut TurnContext,
        session_id: SessionId,
        model: Option<&str>,
        timeout: Duration,
        active: &ActiveTurn,
    ) -> Result<TurnOutcome, ApplicationError> {
        // 3. 解析提供商
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.settings.default_model)
            .to_string();

        let ResolvedProvider { provider_id, port } = self.resolver.resolve(&model).map_err(|e| {
            warn!("[dispatch] Cannot resolve model '{}': {}", model, e);
            ctx.fail(TurnStage::ProviderResolved, e)
        })?;
        ctx.advance(TurnStage::ProviderResolved);

        // 4. 以完整有序历史调用提供商
        let history = self
            .store
            .messages(session_id)
            .await
            .map_err(|e| ctx.fail(TurnStage::ReplyGenerated, e))?;
        let request = CompletionRequest::new(self.context_builder.build(&history), model.clone())
            .with_temperature(self.settings.temperature);

        debug!(
            "[dispatch] Invoking provider '{}' with {} messages (timeout {:?})",
            provider_id,
            request.messages.len(),
            timeout
        );

        let response = tokio::select! {
            result = tokio::time::timeout(timeout, port.generate(request)) => match result {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!("[dispatch] Provider '{}' failed: {}", provider_id, e);
                    return Err(ctx.fail(TurnStage::ReplyGenerated, DispatchErrorKind::Provider(e)).into());
                }
                Err(_) => {
                    warn!("[dispatch] Provider '{}' timed out after {:?}", provider_id, timeout);
                    let e = ProviderError::timeout(format!("No reply within {}s", timeout.as_secs_f32()));
                    return Err(ctx.fail(TurnStage::ReplyGenerated, DispatchErrorKind::Provider(e)).into());
                }
            },
            _ = active.cancelled() => {
                info!("[dispatch] Turn on session {} cancelled", session_id);
                return Err(ctx.fail(TurnStage::ReplyGenerated, DispatchErrorKind::Cancelled).into());
            }
        };
        ctx.advance(TurnStage::ReplyGenerated);

        // 5. 追加助手消息
        let mut reply = Message::new_assistant(session_id, response.content)
            .with_metadata(metadata_keys::MODEL, model.as_str())
            .with_metadata(metadata_keys::PROVIDER, provider_id.as_str());
        if let Some(usage) = response.usage {
            reply = reply
                .with_metadata(metadata_keys::PROMPT_TOKENS, usage.prompt_tokens.to_string())
                .with_metadata(
                    metadata_keys::COMPLETION_TOKENS,
                    usage.completion_tokens.to_string(),
                );
        }

        let message = self
            .store
            .append(reply)
            .await
            .map_err(|e| ctx.fail(TurnStage::Persisted, e))?;
        ctx.advance(TurnStage::Persisted);

        Ok(TurnOutcome {
            session_id,
            user_message_id: ctx.user_message_id,
            message,
        })
    }

    fn effective_timeout(&self, requested: Option<Duration>) -> Result<Duration, ApplicationError> {
        match requested {
            Some(timeout) if timeout.is_zero() => Err(ApplicationError::ValidationError(
                "Timeout must be greater than zero".to_string(),
            )),
            Some(timeout) => Ok(timeout),
            None => Ok(self.settings.provider_timeout),
        }
    }
}
