// Config Domain Layer
//
// 领域层定义配置的结构、默认值和校验规则

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
