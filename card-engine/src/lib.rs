//! Card Engine - 卡片变更与提交模型
//!
//! # 架构概述
//!
//! 一张卡片 (订单/票据) 是一棵树：标签 (明细行) 加子卡片。所有修改都以
//! 动作 (`Action`) 的形式经过注册的卡片操作，先作为待提交动作应用到本地，
//! 再打包成不可变的提交 (`Commit`) 合并回卡片。
//!
//! - **操作** (`operations`): 可插拔的卡片操作及其注册表
//! - **规则状态** (`rules`): 操作读写的会话级命名状态
//! - **归约** (`reducer`): 单个动作的应用流程
//! - **卡片存储** (`store`): 待提交队列、提交合并、视图
//! - **提交日志** (`storage`, `commit_log`): redb 本地提交历史
//! - **会话** (`session`): 存储与传输层的连接
//!
//! # 模块结构
//!
//! ```text
//! card-engine/src/
//! ├── operations/    # CardOperation trait, 内置操作, 注册表
//! ├── store/         # CardStore, 待提交动作, 视图
//! ├── reducer.rs     # 动作归约流程
//! ├── rules.rs       # RuleManager
//! ├── storage.rs     # redb 存储
//! ├── commit_log.rs  # 本地 CardTransport 实现
//! ├── transport.rs   # CardTransport trait
//! ├── session.rs     # CardSession
//! ├── config.rs      # 环境变量配置
//! ├── logger.rs      # 日志初始化
//! └── error.rs       # EngineError
//! ```

pub mod commit_log;
pub mod config;
pub mod error;
pub mod logger;
pub mod operations;
pub mod reducer;
pub mod rules;
pub mod session;
pub mod storage;
pub mod store;
pub mod transport;

// Re-export 公共类型
pub use commit_log::LocalCommitLog;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use operations::{
    BuiltinOperation, CardOperation, EditorKind, OperationContext, OperationError,
    OperationRegistry, RegistryError, default_data,
};
pub use reducer::{Applied, Reducer};
pub use rules::{ReadOnlyState, RuleManager, StagedState, StateStore};
pub use session::CardSession;
pub use storage::{CommitStorage, StorageError, StorageStats};
pub use store::{CardStore, CardView, HistoryEntry, MergeReport, PendingAction, SortKey};
pub use transport::{CardTransport, TransportError};

// Re-export logger functions
pub use logger::{init_logger, init_logger_with_file};

/// 设置运行环境: dotenv, 工作目录, 日志
pub fn setup_environment() -> std::io::Result<EngineConfig> {
    dotenv::dotenv().ok();
    let config = EngineConfig::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    Ok(config)
}
