// ==========================================
// UCM需求登记系统 - 引擎层
// ==========================================
// 职责: 模板驱动的记录校验、上传对账、重复与日期闸门、提交组装
// 红线: 引擎为纯计算，不拼 SQL，不做 I/O；
//       所需数据由 EngineContext 一次性提供
// ==========================================

pub mod assembler;
pub mod batch;
pub mod context;
pub mod date_gate;
pub mod duplicate;
pub mod error;
pub mod export;
pub mod reconciler;
pub mod validator;

// 重导出核心引擎
pub use assembler::SubmissionAssembler;
pub use batch::{Batch, BatchRow};
pub use context::EngineContext;
pub use date_gate::{DateGate, EligibleDate};
pub use duplicate::DuplicateGate;
pub use error::{EngineError, EngineResult};
pub use export::{ExportRowBuilder, EXPORT_HEADERS};
pub use reconciler::{BatchReconciler, ColumnDiff};
pub use validator::{is_ipv4_format, RecordValidator};
