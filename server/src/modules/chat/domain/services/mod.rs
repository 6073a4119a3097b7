// Chat Domain - Services
// 领域服务封装不属于单个实体的业务逻辑

mod context_builder;

pub use context_builder::*;
