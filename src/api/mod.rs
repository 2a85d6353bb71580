// ==========================================
// UCM需求登记系统 - API 层
// ==========================================
// 职责: 登记会话编排与管理操作，供 CLI / 上层界面调用
// ==========================================

pub mod admin_api;
pub mod error;
pub mod register_api;

// 重导出核心类型
pub use admin_api::AdminApi;
pub use error::{ApiError, ApiResult};
pub use register_api::{
    DuplicateReport, RegisterApi, RegisterSession, SubmitReceipt, ValidationSummary,
};
