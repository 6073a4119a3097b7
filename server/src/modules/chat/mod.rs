// Chat Module - 聊天模块
//
// 实现六边形架构（Hexagonal Architecture）：
// - domain: 领域层，包含实体、值对象和领域服务
// - ports: 端口层，定义与外部世界的抽象接口
// - infrastructure: 基础设施层，实现端口的具体适配器
// - application: 应用层，实现 CQRS 命令和查询处理器以及对话调度

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型
pub use application::{
    // Traits
    ApplicationError,
    ChatSettings,
    CommandHandler,
    // Commands
    CreateSessionCommand,
    CreateSessionHandler,
    CreateSessionResponse,
    DeleteSessionCommand,
    DeleteSessionHandler,
    DeleteSessionResponse,
    // Dispatch
    DispatchError,
    DispatchErrorKind,
    Dispatcher,
    // Queries
    GetSessionHandler,
    GetSessionQuery,
    ListProvidersHandler,
    ListProvidersQuery,
    ListSessionsHandler,
    ListSessionsQuery,
    ListSessionsResponse,
    QueryHandler,
    RegenerateCommand,
    RegenerateHandler,
    SendMessageCommand,
    SendMessageHandler,
    SendMessageResponse,
    SessionDetail,
    SessionStore,
    SessionSummary,
    StopGenerationCommand,
    StopGenerationHandler,
    StopGenerationResponse,
    TurnCoordinator,
    TurnStage,
    UnsupportedReason,
    UpdateSessionCommand,
    UpdateSessionHandler,
    UpdateSessionResponse,
};

pub use domain::{ContextBuilder, Message, MessageId, MessageRole, Session, SessionId};

pub use infrastructure::{
    EchoAdapter, FileMessageRepository, FileSessionRepository, InMemoryMessageRepository,
    InMemorySessionRepository, ProviderRegistry,
};

pub use ports::{
    CompletionRequest, CompletionResponse, LLMPort, LLMProviderConfig, MessageRepository,
    PaginatedResult, Pagination, ProviderError, ProviderErrorKind, ProviderInfo, ProviderResolver,
    ProviderType, RepositoryError, SessionRepository, TokenUsage,
};

use std::path::Path;
use std::sync::Arc;

/// Chat 模块容器
///
/// 管理模块内的依赖注入
pub struct ChatModule {
    store: Arc<SessionStore>,
    resolver: Arc<dyn ProviderResolver>,
    // Handlers
    create_session_handler: CreateSessionHandler,
    delete_session_handler: DeleteSessionHandler,
    update_session_handler: UpdateSessionHandler,
    send_message_handler: SendMessageHandler,
    regenerate_handler: RegenerateHandler,
    stop_generation_handler: StopGenerationHandler,
    get_session_handler: GetSessionHandler,
    list_sessions_handler: ListSessionsHandler,
    list_providers_handler: ListProvidersHandler,
}

impl ChatModule {
    /// 创建新的 ChatModule 实例（内存存储，用于开发测试）
    pub fn new(resolver: Arc<dyn ProviderResolver>, settings: ChatSettings) -> Self {
        let session_repository: Arc<dyn SessionRepository> =
            Arc::new(InMemorySessionRepository::new());
        let message_repository: Arc<dyn MessageRepository> =
            Arc::new(InMemoryMessageRepository::new());

        Self::with_repositories(session_repository, message_repository, resolver, settings)
    }

    /// 创建带持久化存储的 ChatModule 实例
    ///
    /// # Errors
    /// 数据文件无法读取或已损坏时返回错误
    pub async fn new_with_persistence(
        data_dir: impl AsRef<Path>,
        resolver: Arc<dyn ProviderResolver>,
        settings: ChatSettings,
    ) -> Result<Self, RepositoryError> {
        let data_dir = data_dir.as_ref();
        let session_repository: Arc<dyn SessionRepository> =
            Arc::new(FileSessionRepository::new(data_dir).await?);
        let message_repository: Arc<dyn MessageRepository> =
            Arc::new(FileMessageRepository::new(data_dir).await?);

        Ok(Self::with_repositories(
            session_repository,
            message_repository,
            resolver,
            settings,
        ))
    }

    /// 使用自定义仓储创建 ChatModule
    pub fn with_repositories(
        session_repository: Arc<dyn SessionRepository>,
        message_repository: Arc<dyn MessageRepository>,
        resolver: Arc<dyn ProviderResolver>,
        settings: ChatSettings,
    ) -> Self {
        let store = Arc::new(
            SessionStore::new(session_repository, message_repository)
                .with_default_title(settings.default_title.clone()),
        );
        let turns = Arc::new(TurnCoordinator::new());
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            resolver.clone(),
            turns.clone(),
            settings,
        ));

        Self {
            create_session_handler: CreateSessionHandler::new(store.clone()),
            delete_session_handler: DeleteSessionHandler::new(store.clone(), turns),
            update_session_handler: UpdateSessionHandler::new(store.clone()),
            send_message_handler: SendMessageHandler::new(dispatcher.clone()),
            regenerate_handler: RegenerateHandler::new(dispatcher.clone()),
            stop_generation_handler: StopGenerationHandler::new(dispatcher),
            get_session_handler: GetSessionHandler::new(store.clone()),
            list_sessions_handler: ListSessionsHandler::new(store.clone()),
            list_providers_handler: ListProvidersHandler::new(resolver.clone()),
            store,
            resolver,
        }
    }

    // Command handlers

    /// 创建会话
    pub async fn create_session(
        &self,
        command: CreateSessionCommand,
    ) -> Result<CreateSessionResponse, ApplicationError> {
        self.create_session_handler.handle(command).await
    }

    /// 删除会话
    pub async fn delete_session(
        &self,
        command: DeleteSessionCommand,
    ) -> Result<DeleteSessionResponse, ApplicationError> {
        self.delete_session_handler.handle(command).await
    }

    /// 重命名会话
    pub async fn update_session(
        &self,
        command: UpdateSessionCommand,
    ) -> Result<UpdateSessionResponse, ApplicationError> {
        self.update_session_handler.handle(command).await
    }

    /// 发送消息并等待回复
    pub async fn send_message(
        &self,
        command: SendMessageCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        self.send_message_handler.handle(command).await
    }

    /// 为待回复的用户消息重新生成回复
    pub async fn regenerate(
        &self,
        command: RegenerateCommand,
    ) -> Result<SendMessageResponse, ApplicationError> {
        self.regenerate_handler.handle(command).await
    }

    /// 停止会话上正在进行的生成
    pub async fn stop_generation(
        &self,
        command: StopGenerationCommand,
    ) -> Result<StopGenerationResponse, ApplicationError> {
        self.stop_generation_handler.handle(command).await
    }

    // Query handlers

    /// 获取会话及其消息
    pub async fn get_session(&self, query: GetSessionQuery) -> Result<SessionDetail, ApplicationError> {
        self.get_session_handler.handle(query).await
    }

    /// 分页列出会话
    pub async fn list_sessions(
        &self,
        query: ListSessionsQuery,
    ) -> Result<ListSessionsResponse, ApplicationError> {
        self.list_sessions_handler.handle(query).await
    }

    /// 列出已配置的提供商
    pub async fn list_providers(&self) -> Result<Vec<ProviderInfo>, ApplicationError> {
        self.list_providers_handler.handle(ListProvidersQuery).await
    }

    // Accessors

    /// 获取会话存储
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// 获取提供商解析器
    pub fn resolver(&self) -> &Arc<dyn ProviderResolver> {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn echo_resolver() -> Arc<dyn ProviderResolver> {
        Arc::new(ProviderRegistry::empty().with_port("echo", &["echo"], Arc::new(EchoAdapter::default())))
    }

    fn settings() -> ChatSettings {
        ChatSettings {
            default_model: "echo".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_chat_module_integration() {
        let module = ChatModule::new(echo_resolver(), settings());

        // 创建会话
        let create_resp = module
            .create_session(CreateSessionCommand::new(Some("Integration Test".to_string())))
            .await
            .unwrap();
        let session_id = create_resp.session.id();
        assert_eq!(create_resp.session.title(), "Integration Test");

        // 发送消息
        let reply = module
            .send_message(SendMessageCommand::new("ping").in_session(session_id))
            .await
            .unwrap();
        assert_eq!(reply.message.content(), "echo: ping");

        // 获取会话
        let detail = module
            .get_session(GetSessionQuery::new(session_id))
            .await
            .unwrap();
        assert_eq!(detail.messages.len(), 2);

        // 列出会话
        let list_resp = module
            .list_sessions(ListSessionsQuery::default())
            .await
            .unwrap();
        assert_eq!(list_resp.total, 1);
        assert_eq!(list_resp.sessions[0].message_count, 2);

        // 删除会话
        let delete_resp = module
            .delete_session(DeleteSessionCommand::new(session_id))
            .await
            .unwrap();
        assert_eq!(delete_resp.deleted_messages, 2);

        let list_resp = module
            .list_sessions(ListSessionsQuery::default())
            .await
            .unwrap();
        assert_eq!(list_resp.total, 0);
    }

    #[tokio::test]
    async fn test_persistent_module_survives_reopen() {
        let dir = TempDir::new().unwrap();

        let session_id = {
            let module = ChatModule::new_with_persistence(dir.path(), echo_resolver(), settings())
                .await
                .unwrap();
            module
                .send_message(SendMessageCommand::new("remember me"))
                .await
                .unwrap()
                .session_id
        };

        let reopened = ChatModule::new_with_persistence(dir.path(), echo_resolver(), settings())
            .await
            .unwrap();
        let detail = reopened
            .get_session(GetSessionQuery::new(session_id))
            .await
            .unwrap();

        let contents: Vec<&str> = detail.messages.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["remember me", "echo: remember me"]);
    }

    #[tokio::test]
    async fn test_list_providers() {
        let module = ChatModule::new(echo_resolver(), settings());

        let providers = module.list_providers().await.unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, "echo");
        assert!(providers[0].available);
    }
}
