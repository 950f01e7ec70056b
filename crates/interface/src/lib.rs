//! JIDE Interface - 交互层
//!
//! 职责：
//! - CLI 命令行工具
//! - 终端聊天界面入口
//! - 单次提问模式 (ask)
//!
//! 架构：
//! - cli/: 命令行接口与配置合并
//! - ask/: 无界面会话，消息逐行输出到 stdout

pub mod ask;
pub mod cli;

pub use ask::{PrintView, run_ask};
pub use cli::{Cli, CliError, run_cli};
