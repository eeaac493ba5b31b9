use std::path::PathBuf;

/// 终端配置 - 卡片引擎的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/pmpos | 工作目录 (数据库、日志) |
/// | TERMINAL_ID | terminal-1 | 终端标识，写入每个提交 |
/// | POS_USER | admin | 当前用户，写入每个提交 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 设置后按天滚动写入日志文件 |
/// | MAX_PENDING_ACTIONS | 500 | 单张卡片最多未提交动作数 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/pmpos TERMINAL_ID=bar-2 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 工作目录
    pub work_dir: String,
    pub terminal_id: String,
    pub user: String,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub max_pending_actions: usize,
}

impl EngineConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/pmpos".into()),
            terminal_id: std::env::var("TERMINAL_ID").unwrap_or_else(|_| "terminal-1".into()),
            user: std::env::var("POS_USER").unwrap_or_else(|_| "admin".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            max_pending_actions: std::env::var("MAX_PENDING_ACTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(
        work_dir: impl Into<String>,
        terminal_id: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.terminal_id = terminal_id.into();
        config.user = user.into();
        config
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("cards.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = EngineConfig::with_overrides("/tmp/pmpos", "bar-2", "bob");
        assert_eq!(config.terminal_id, "bar-2");
        assert_eq!(config.user, "bob");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/pmpos").join("cards.redb")
        );
        assert!(config.max_pending_actions > 0);
    }
}
