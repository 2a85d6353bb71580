// ==========================================
// UCM需求登记系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod deadline_config_trait;
pub mod engine_settings;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use deadline_config_trait::DeadlineConfigReader;
pub use engine_settings::{EngineSettings, HierarchyFields};
