//! JIDE Core - 客户端领域模型
//!
//! 包含：
//! - SessionId: 会话标识
//! - ServerEvent: 推送通道事件
//! - DisplayMessage: 渲染后的消息与日志
//! - Protocol: 后端请求/响应与宿主命令编码
//! - Config: 配置与加载

mod config;
mod error;
mod event;
mod message;
mod protocol;
mod session;

pub use config::*;
pub use error::*;
pub use event::*;
pub use message::*;
pub use protocol::*;
pub use session::*;
