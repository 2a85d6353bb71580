// ==========================================
// UCM需求登记系统 - 外部协作方 Trait
// ==========================================
// 职责: 定义引擎会话所需的数据来源与持久化接口（不包含实现）
// 红线: 每次调用视为一次原子外部调用，只有成功 / 失败两种结果
// ==========================================

use crate::domain::catalog::{HierarchyCatalog, OptionSet};
use crate::domain::requirement::{CommitUnit, StoredRequirement};
use crate::domain::template::TemplateSet;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::NaiveDate;

// ==========================================
// TemplateSource - 模板来源
// ==========================================
// 实现者: TemplateRepository
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// 读取三类需求模板及 delete 的模板解析规则
    async fn load_templates(&self) -> RepositoryResult<TemplateSet>;
}

// ==========================================
// CatalogSource - 可选值与厂商版本目录来源
// ==========================================
// 实现者: CatalogRepository
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// 读取列 → 可选值清单
    async fn load_options(&self) -> RepositoryResult<OptionSet>;

    /// 读取 (设备类型, 厂商, 版本) 目录
    async fn load_hierarchy(&self) -> RepositoryResult<HierarchyCatalog>;
}

// ==========================================
// RequirementStore - 需求持久化
// ==========================================
// 实现者: RequirementRepository
#[async_trait]
pub trait RequirementStore: Send + Sync {
    /// 查询某变更日期的待处理需求
    async fn list_pending_by_date(&self, date: NaiveDate)
        -> RepositoryResult<Vec<StoredRequirement>>;

    /// 提交整个提交单元（单事务，全部成功或全部回滚）
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 新建需求ID（与记录顺序一致）
    async fn submit_batch(&self, unit: &CommitUnit) -> RepositoryResult<Vec<i64>>;
}
