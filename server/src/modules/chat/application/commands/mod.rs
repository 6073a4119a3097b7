// Chat Commands - 命令定义和处理器

mod create_session;
mod delete_session;
mod regenerate;
mod send_message;
mod stop_generation;
mod update_session;

pub use create_session::*;
pub use delete_session::*;
pub use regenerate::*;
pub use send_message::*;
pub use stop_generation::*;
pub use update_session::*;
