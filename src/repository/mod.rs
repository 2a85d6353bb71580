// ==========================================
// UCM需求登记系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod inventory_repo;
pub mod requirement_repo;
pub mod template_repo;
pub mod traits;

// 重导出核心仓储
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::InventoryRepository;
pub use requirement_repo::{RequirementFilter, RequirementRepository};
pub use template_repo::TemplateRepository;
pub use traits::{CatalogSource, RequirementStore, TemplateSource};
