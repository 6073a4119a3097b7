// Config Application Layer
//
// 应用层负责按顺序合并配置来源并校验

mod loader;

pub use loader::*;
