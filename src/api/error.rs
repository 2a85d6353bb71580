// ==========================================
// UCM需求登记系统 - API层错误类型
// ==========================================
// 职责: 汇总引擎 / 上传 / 仓储错误，转换为面向操作员的错误消息
// 红线: 外部协作方的技术故障统一视为 UpstreamUnavailable，
//       调用方可以原样重试
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 引擎错误（对账 / 日期 / 提交 / 工作集）
    // ==========================================
    #[error(transparent)]
    Engine(#[from] EngineError),

    // ==========================================
    // 上传错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 外部协作方不可用（可重试）
    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Engine(EngineError::UpstreamUnavailable(message.into()))
    }

    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, ApiError::Engine(EngineError::UpstreamUnavailable(_)))
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 技术故障 → UpstreamUnavailable；业务结果保留原语义
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(msg)
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InvalidTemplate(err) => ApiError::Engine(EngineError::Template(err)),
            RepositoryError::InvalidDeadlineConfig(err) => {
                ApiError::Engine(EngineError::DeadlineConfig(err))
            }

            // 数据库 / 序列化故障
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::upstream(msg),
            RepositoryError::SerializationError(err) => ApiError::upstream(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
