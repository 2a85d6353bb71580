// ==========================================
// UCM需求登记系统 - 引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 单元格级问题是数据（ValidationResult），不是错误；
//       这里只放批次级 / 提交级的失败
// ==========================================

use crate::domain::deadline::DeadlineConfigError;
use crate::domain::template::TemplateError;
use crate::domain::types::RecordType;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    // ===== 对账错误 =====
    #[error("上传列与模板不一致: 缺少列 {missing:?}, 多余列 {extra:?}")]
    SchemaMismatch {
        missing: BTreeSet<String>,
        extra: BTreeSet<String>,
    },

    #[error("数据行数不能超过{limit}行 (实际 {count} 行)")]
    RowLimitExceeded { count: usize, limit: usize },

    #[error("上传文件为空或格式不正确")]
    EmptyUpload,

    // ===== 日期错误 =====
    #[error("UCM变更日期不可登记: {date}")]
    IneligibleDate { date: NaiveDate },

    #[error("请先选择UCM变更日期")]
    ChangeDateMissing,

    // ===== 提交错误 =====
    #[error("存在校验未通过的记录，无法提交 (行: {invalid_rows:?})")]
    ValidationIncomplete { invalid_rows: Vec<u64> },

    #[error("批次中没有需求数据")]
    EmptyBatch,

    #[error("需求类型不一致: 批次={batch}, 提交={requested}")]
    RecordTypeMismatch {
        batch: RecordType,
        requested: RecordType,
    },

    #[error("去除重复记录后没有可提交的数据")]
    NothingToSubmit,

    #[error("已有请求正在处理中: {0}")]
    RequestInFlight(&'static str),

    // ===== 工作集错误 =====
    #[error("行不存在: row_id={0}")]
    RowNotFound(u64),

    #[error("模板中不存在列: {0}")]
    UnknownColumn(String),

    // ===== 配置错误 =====
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    DeadlineConfig(#[from] DeadlineConfigError),

    // ===== 外部协作方 =====
    #[error("外部服务不可用: {0}")]
    UpstreamUnavailable(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
