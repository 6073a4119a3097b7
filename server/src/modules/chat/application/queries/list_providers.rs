use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::ports::{ProviderInfo, ProviderResolver};

/// 列出已配置提供商的查询
#[derive(Debug, Clone, Default)]
pub struct ListProvidersQuery;

/// 列出提供商处理器
pub struct ListProvidersHandler {
    resolver: Arc<dyn ProviderResolver>,
}

impl ListProvidersHandler {
    pub fn new(resolver: Arc<dyn ProviderResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl QueryHandler<ListProvidersQuery, Vec<ProviderInfo>> for ListProvidersHandler {
    async fn handle(&self, _query: ListProvidersQuery) -> Result<Vec<ProviderInfo>, ApplicationError> {
        Ok(self.resolver.providers())
    }
}
