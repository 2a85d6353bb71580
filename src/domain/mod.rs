// ==========================================
// UCM需求登记系统 - 领域层
// ==========================================
// 职责: 领域实体与值对象，不含 I/O
// ==========================================

pub mod catalog;
pub mod deadline;
pub mod inventory;
pub mod requirement;
pub mod template;
pub mod types;
pub mod upload;

// 重导出核心类型
pub use catalog::{HierarchyCatalog, HierarchyEntry, OptionSet};
pub use deadline::{DeadlineConfig, DeadlineConfigError};
pub use inventory::{
    InventoryDevice, InventoryImportReport, InventoryRowError, StoredInventoryDevice,
};
pub use requirement::{
    CommitUnit, DuplicateKey, FieldError, FinalizedRecord, Record, StoredRequirement,
    ValidationErrorKind, ValidationResult,
};
pub use template::{ColumnDefinition, MoveDirection, Schema, TemplateError, TemplateSet};
pub use types::{RecordType, RequirementStatus};
pub use upload::UploadTable;
