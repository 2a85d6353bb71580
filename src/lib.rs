// ==========================================
// UCM需求登记系统 - 核心库
// ==========================================
// 职责: 模板驱动的设备变更需求登记
// - 记录逐字段校验（必填 / IPv4 / 可选值 / 设备类型-厂商-版本级联）
// - 上传文件与模板的列对账
// - 待处理需求重复检查、变更日期截止判定
// - 提交单元组装与持久化
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值类型
pub mod domain;

// 数据仓储层 - 外部协作方的 SQLite 实现
pub mod repository;

// 引擎层 - 校验 / 对账 / 闸门 / 组装
pub mod engine;

// 上传来源层 - Excel / CSV
pub mod importer;

// 配置层 - 截止时间与引擎参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 登记会话与管理操作
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{RecordType, RequirementStatus};

// 领域值对象
pub use domain::{
    ColumnDefinition, CommitUnit, DeadlineConfig, DuplicateKey, HierarchyCatalog,
    HierarchyEntry, InventoryDevice, InventoryImportReport, OptionSet, Record, Schema,
    StoredRequirement, TemplateSet, UploadTable, ValidationErrorKind, ValidationResult,
};

// 引擎
pub use engine::{
    Batch, BatchReconciler, DateGate, DuplicateGate, EngineContext, EngineError,
    RecordValidator, SubmissionAssembler,
};

// API
pub use api::{AdminApi, ApiError, ApiResult, RegisterApi, RegisterSession};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "UCM需求登记系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "UCM需求登记系统");
    }
}
