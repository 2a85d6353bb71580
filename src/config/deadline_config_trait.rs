// ==========================================
// UCM需求登记系统 - 截止时间配置读取 Trait
// ==========================================
// 职责: 定义会话加载所需的截止时间配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::deadline::DeadlineConfig;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DeadlineConfigReader Trait
// ==========================================
// 用途: 会话上下文加载时读取截止时间配置
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait DeadlineConfigReader: Send + Sync {
    /// 读取截止时间配置
    ///
    /// # 默认值
    /// - 周三 7 小时，周六 31 小时
    async fn read_deadline_config(&self) -> RepositoryResult<DeadlineConfig>;
}
