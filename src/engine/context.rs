// ==========================================
// UCM需求登记系统 - 会话上下文
// ==========================================
// 职责: 一次会话内冻结的模板 / 可选值 / 目录 / 截止配置
// 红线: 上下文不可变；重新加载生成新的上下文，不修改共享状态
// ==========================================

use crate::config::EngineSettings;
use crate::domain::catalog::{HierarchyCatalog, OptionSet};
use crate::domain::deadline::DeadlineConfig;
use crate::domain::template::{Schema, TemplateSet};
use crate::domain::types::RecordType;
use crate::engine::validator::RecordValidator;
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct EngineContext {
    record_type: RecordType,
    schema: Schema,
    options: OptionSet,
    hierarchy: HierarchyCatalog,
    deadline: DeadlineConfig,
    settings: EngineSettings,
    loaded_at: NaiveDateTime,
}

impl EngineContext {
    /// 由加载结果组装上下文（模板按需求类型解析）
    pub fn new(
        record_type: RecordType,
        templates: &TemplateSet,
        options: OptionSet,
        hierarchy: HierarchyCatalog,
        deadline: DeadlineConfig,
        settings: EngineSettings,
        loaded_at: NaiveDateTime,
    ) -> Self {
        Self {
            record_type,
            schema: templates.effective_schema(record_type).clone(),
            options,
            hierarchy,
            deadline,
            settings,
            loaded_at,
        }
    }

    /// 直接指定模板（测试和单模板场景）
    pub fn with_schema(
        record_type: RecordType,
        schema: Schema,
        options: OptionSet,
        hierarchy: HierarchyCatalog,
        deadline: DeadlineConfig,
        settings: EngineSettings,
        loaded_at: NaiveDateTime,
    ) -> Self {
        Self {
            record_type,
            schema,
            options,
            hierarchy,
            deadline,
            settings,
            loaded_at,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn hierarchy(&self) -> &HierarchyCatalog {
        &self.hierarchy
    }

    pub fn deadline(&self) -> &DeadlineConfig {
        &self.deadline
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn loaded_at(&self) -> NaiveDateTime {
        self.loaded_at
    }

    pub fn validator(&self) -> RecordValidator<'_> {
        RecordValidator::new(&self.schema, &self.options, &self.hierarchy, &self.settings)
    }
}
