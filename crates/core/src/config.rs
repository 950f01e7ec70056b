//! JIDE 配置系统
//!
//! 支持 YAML 配置文件和环境变量

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{ConfigError, SessionId};

/// JIDE 客户端主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 显式会话 ID
    pub session_id: Option<String>,

    /// 项目路径 (未指定会话 ID 时用于推导)
    pub project: Option<PathBuf>,

    /// 后端配置
    pub server: ServerConfig,

    /// 推送通道配置
    pub stream: StreamConfig,

    /// 滚动抑制配置
    pub scroll: ScrollConfig,

    /// 宿主桥接配置
    pub host: HostConfig,

    /// 输入配置
    pub input: InputConfig,

    /// 终端界面配置
    pub ui: UiConfig,
}

/// 后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 后端基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 请求超时 (秒)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// 推送通道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// 重连延迟 (毫秒)
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

fn default_reconnect_delay() -> u64 {
    3000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// 滚动抑制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// 视为"接近底部"的滚动比例阈值
    #[serde(default = "default_bottom_threshold")]
    pub bottom_threshold: f64,

    /// 抑制窗口 (秒)
    #[serde(default = "default_suppression_window")]
    pub suppression_window_secs: u64,
}

fn default_bottom_threshold() -> f64 {
    0.95
}

fn default_suppression_window() -> u64 {
    30
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            bottom_threshold: default_bottom_threshold(),
            suppression_window_secs: default_suppression_window(),
        }
    }
}

impl ScrollConfig {
    pub fn suppression_window(&self) -> Duration {
        Duration::from_secs(self.suppression_window_secs)
    }
}

/// 宿主桥接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// 宿主桥接 URL (未设置时桥接调用总是失败)
    pub bridge_url: Option<String>,

    /// 嵌入模式: 状态更新转发给宿主而不是本地渲染
    #[serde(default)]
    pub embedded: bool,

    /// 启动时视图是否可见
    #[serde(default = "default_true")]
    pub start_visible: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bridge_url: None,
            embedded: false,
            start_visible: true,
        }
    }
}

/// 输入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// 输入此文本等同于按下停止 (null 关闭)
    #[serde(default = "default_stop_sentinel")]
    pub stop_sentinel: Option<String>,
}

fn default_stop_sentinel() -> Option<String> {
    Some("!!".to_string())
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            stop_sentinel: default_stop_sentinel(),
        }
    }
}

/// 终端界面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// 事件轮询间隔 (毫秒)
    #[serde(default = "default_tick")]
    pub tick_ms: u64,
}

fn default_tick() -> u64 {
    20
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("server.base_url is empty".to_string()));
        }
        let threshold = self.scroll.bottom_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "scroll.bottom_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.scroll.suppression_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "scroll.suppression_window_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Explicit id wins; otherwise the id is derived from the project path.
    pub fn resolve_session_id(&self) -> Result<SessionId, ConfigError> {
        if let Some(id) = self.session_id.as_deref() {
            return SessionId::new(id).map_err(|e| ConfigError::Invalid(e.to_string()));
        }
        if let Some(project) = self.project.as_deref() {
            return Ok(SessionId::from_project_path(project));
        }
        Err(ConfigError::Invalid(
            "no session id or project configured".to_string(),
        ))
    }
}

pub fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?.to_lowercase();
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse::<u64>().ok()
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 配置加载器
///
/// 查找顺序：显式路径 → `$JIDE_CONFIG` → `./.jide/config.yaml` → `<config dir>/jide/config.yaml`。
/// 之后应用 `JIDE_*` 环境变量覆盖。
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: ClientConfig,
    source: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = env_string("JIDE_CONFIG") {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from(".jide").join("config.yaml"));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("jide").join("config.yaml"));
        }
        paths
    }

    /// An explicit path must exist; implicit candidates are skipped when absent.
    pub fn load(&mut self, explicit: Option<&Path>) -> Result<(), ConfigError> {
        if let Some(path) = explicit {
            self.config = Self::load_file(path)?;
            self.source = Some(path.to_path_buf());
        } else if let Some(path) = Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            self.config = Self::load_file(&path)?;
            self.source = Some(path);
        }
        self.apply_env_overrides();
        if let Some(path) = &self.source {
            tracing::debug!("loaded config from {}", path.display());
        }
        Ok(())
    }

    pub fn load_file(path: &Path) -> Result<ClientConfig, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(ClientConfig::default());
        }
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = env_string("JIDE_SERVER_URL") {
            self.config.server.base_url = url;
        }
        if let Some(id) = env_string("JIDE_SESSION_ID") {
            self.config.session_id = Some(id);
        }
        if let Some(url) = env_string("JIDE_BRIDGE_URL") {
            self.config.host.bridge_url = Some(url);
        }
        if let Some(embedded) = env_bool("JIDE_EMBEDDED") {
            self.config.host.embedded = embedded;
        }
        if let Some(delay) = env_u64("JIDE_RECONNECT_DELAY_MS") {
            self.config.stream.reconnect_delay_ms = delay;
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn into_config(self) -> ClientConfig {
        self.config
    }
}
