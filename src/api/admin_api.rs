// ==========================================
// UCM需求登记系统 - 管理 API
// ==========================================
// 职责: 模板维护、可选值 / 厂商版本目录维护、截止时间配置、
//       UCM设备清单导入、需求查询与处理、导出行构造
// 说明: 管理操作直接作用于仓储；登记会话在下一次加载 / 重新校验时生效
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, EngineSettings};
use crate::domain::catalog::{HierarchyCatalog, HierarchyEntry, OptionSet};
use crate::domain::deadline::DeadlineConfig;
use crate::domain::inventory::{
    inventory_columns, InventoryDevice, InventoryImportReport, StoredInventoryDevice,
};
use crate::domain::requirement::StoredRequirement;
use crate::domain::template::{ColumnDefinition, MoveDirection, Schema, TemplateSet};
use crate::domain::types::RecordType;
use crate::domain::upload::UploadTable;
use crate::engine::{BatchReconciler, EngineError, ExportRowBuilder};
use crate::importer::UniversalFileParser;
use crate::repository::{
    CatalogRepository, InventoryRepository, RequirementFilter, RequirementRepository,
    TemplateRepository,
};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

// ==========================================
// AdminApi - 管理 API
// ==========================================

/// 管理API
///
/// 职责：
/// 1. 三类需求模板的列维护
/// 2. 列可选值与 (设备类型, 厂商, 版本, 认证方式) 目录维护
/// 3. 周三 / 周六截止提前小时数
/// 4. UCM设备清单整体导入
/// 5. 需求查询、标记已处理、批量完成、导出
pub struct AdminApi {
    templates: Arc<TemplateRepository>,
    catalog: Arc<CatalogRepository>,
    inventory: Arc<InventoryRepository>,
    requirements: Arc<RequirementRepository>,
    config_manager: Arc<ConfigManager>,
    settings: EngineSettings,
}

impl AdminApi {
    pub fn new(
        templates: Arc<TemplateRepository>,
        catalog: Arc<CatalogRepository>,
        inventory: Arc<InventoryRepository>,
        requirements: Arc<RequirementRepository>,
        config_manager: Arc<ConfigManager>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            templates,
            catalog,
            inventory,
            requirements,
            config_manager,
            settings,
        }
    }

    // ==========================================
    // 模板维护
    // ==========================================

    pub fn get_template_set(&self) -> ApiResult<TemplateSet> {
        Ok(self.templates.get_template_set()?)
    }

    /// 某需求类型实际生效的模板（delete 可能沿用 import 模板）
    pub fn get_effective_schema(&self, record_type: RecordType) -> ApiResult<Schema> {
        let set = self.templates.get_template_set()?;
        Ok(set.effective_schema(record_type).clone())
    }

    pub fn add_column(
        &self,
        record_type: RecordType,
        column: ColumnDefinition,
    ) -> ApiResult<Schema> {
        let schema = self.templates.add_column(record_type, column)?;
        tracing::info!(record_type = %record_type, columns = schema.len(), "模板新增列");
        Ok(schema)
    }

    pub fn edit_column(
        &self,
        record_type: RecordType,
        index: usize,
        column: ColumnDefinition,
    ) -> ApiResult<Schema> {
        let schema = self.templates.edit_column(record_type, index, column)?;
        tracing::info!(record_type = %record_type, index, "模板列已修改");
        Ok(schema)
    }

    pub fn remove_column(&self, record_type: RecordType, index: usize) -> ApiResult<Schema> {
        let schema = self.templates.remove_column(record_type, index)?;
        tracing::info!(record_type = %record_type, index, "模板列已删除");
        Ok(schema)
    }

    pub fn move_column(
        &self,
        record_type: RecordType,
        index: usize,
        direction: MoveDirection,
    ) -> ApiResult<Schema> {
        Ok(self.templates.move_column(record_type, index, direction)?)
    }

    /// 设置 delete 需求是否沿用 import 模板
    pub fn set_delete_uses_import(&self, enabled: bool) -> ApiResult<()> {
        self.config_manager.set_delete_uses_import(enabled)?;
        tracing::info!(enabled, "delete 模板解析规则已更新");
        Ok(())
    }

    /// 模板下载内容: 表头行 + 示例行
    pub fn template_rows(&self, record_type: RecordType) -> ApiResult<Vec<Vec<String>>> {
        let schema = self.get_effective_schema(record_type)?;
        Ok(ExportRowBuilder::template_rows(&schema))
    }

    // ==========================================
    // 可选值 / 目录维护
    // ==========================================

    pub fn list_options(&self) -> ApiResult<OptionSet> {
        Ok(self.catalog.list_options()?)
    }

    /// 添加列可选值
    ///
    /// # 返回
    /// - Ok(true): 新增成功
    /// - Ok(false): 已存在
    pub fn add_option(&self, column: &str, value: &str) -> ApiResult<bool> {
        Ok(self.catalog.add_option(column, value)?)
    }

    pub fn remove_option(&self, column: &str, value: &str) -> ApiResult<bool> {
        Ok(self.catalog.remove_option(column, value)?)
    }

    pub fn list_hierarchy(&self) -> ApiResult<HierarchyCatalog> {
        Ok(self.catalog.list_hierarchy()?)
    }

    pub fn add_hierarchy_entry(&self, entry: &HierarchyEntry) -> ApiResult<bool> {
        Ok(self.catalog.add_hierarchy_entry(entry)?)
    }

    pub fn remove_hierarchy_entry(&self, entry: &HierarchyEntry) -> ApiResult<bool> {
        Ok(self.catalog.remove_hierarchy_entry(entry)?)
    }

    /// 某 (设备类型, 厂商, 版本) 下登记的认证方式
    pub fn login_methods(
        &self,
        device_type: &str,
        manufacturer: &str,
        version: &str,
    ) -> ApiResult<Vec<String>> {
        let (device_type, manufacturer, version) =
            (device_type.trim(), manufacturer.trim(), version.trim());
        if device_type.is_empty() || manufacturer.is_empty() || version.is_empty() {
            return Err(ApiError::InvalidInput(
                "设备类型、厂商、版本均不能为空".to_string(),
            ));
        }
        let catalog = self.catalog.list_hierarchy()?;
        Ok(catalog
            .login_methods(device_type, manufacturer, version)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    // ==========================================
    // UCM设备清单
    // ==========================================

    /// 用上传表格整体替换设备清单
    ///
    /// # 参数
    /// - `table`: 上传表格，按列名取值，缺少的可选列记为空
    /// - `now`: 导入时间
    ///
    /// # 返回
    /// - Ok(report): 导入条数与逐行错误
    /// - Err(SchemaMismatch): 缺少名称或 IP 列，清单保持不变
    /// - Err(EmptyUpload): 没有数据行，清单保持不变
    pub fn import_inventory_upload(
        &self,
        table: &UploadTable,
        now: NaiveDateTime,
    ) -> ApiResult<InventoryImportReport> {
        if !table.has_headers() || table.rows.is_empty() {
            return Err(EngineError::EmptyUpload.into());
        }

        let headers: BTreeSet<&str> = table.headers.iter().map(|h| h.trim()).collect();
        let missing: BTreeSet<String> = inventory_columns::REQUIRED
            .iter()
            .filter(|name| !headers.contains(*name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::SchemaMismatch {
                missing,
                extra: BTreeSet::new(),
            }
            .into());
        }

        let devices: Vec<InventoryDevice> = BatchReconciler::new(self.settings.max_upload_rows)
            .map_rows(&table.rows, &table.headers)
            .iter()
            .map(InventoryDevice::from_record)
            .collect();
        let report = self.inventory.replace_all(&devices, now)?;
        tracing::info!(
            rows = devices.len(),
            imported = report.imported,
            failed = report.errors.len(),
            "UCM设备清单已导入"
        );
        Ok(report)
    }

    /// 解析清单文件并整体替换
    pub fn import_inventory_file<P: AsRef<Path>>(
        &self,
        path: P,
        now: NaiveDateTime,
    ) -> ApiResult<InventoryImportReport> {
        let table = UniversalFileParser::new(self.settings.max_upload_bytes).parse(path)?;
        self.import_inventory_upload(&table, now)
    }

    pub fn list_inventory(&self, search: Option<&str>) -> ApiResult<Vec<StoredInventoryDevice>> {
        Ok(self.inventory.list(search)?)
    }

    // ==========================================
    // 截止时间配置
    // ==========================================

    pub fn get_deadline_config(&self) -> ApiResult<DeadlineConfig> {
        Ok(self.config_manager.get_deadline_config()?)
    }

    /// 更新周三 / 周六截止提前小时数
    ///
    /// # 参数
    /// - `wednesday_hours`: 周三变更的提前小时数
    /// - `saturday_hours`: 周六变更的提前小时数
    ///
    /// # 返回
    /// - Err(DeadlineConfig): 超出允许范围，配置不变
    pub fn update_deadline_config(
        &self,
        wednesday_hours: i32,
        saturday_hours: i32,
    ) -> ApiResult<DeadlineConfig> {
        let config =
            DeadlineConfig::new(wednesday_hours, saturday_hours).map_err(EngineError::from)?;
        self.config_manager.update_deadline_config(&config)?;
        tracing::info!(wednesday_hours, saturday_hours, "截止时间配置已更新");
        Ok(config)
    }

    // ==========================================
    // 需求查询与处理
    // ==========================================

    pub fn query_requirements(
        &self,
        filter: &RequirementFilter,
    ) -> ApiResult<Vec<StoredRequirement>> {
        Ok(self.requirements.query(filter)?)
    }

    pub fn get_requirement(&self, id: i64) -> ApiResult<StoredRequirement> {
        self.requirements
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("需求(id={})不存在", id)))
    }

    /// 标记单条需求为已处理
    pub fn mark_processed(&self, id: i64, processor: &str, now: NaiveDateTime) -> ApiResult<()> {
        let processor = require_processor(processor)?;
        self.requirements.mark_processed(id, processor, now)?;
        tracing::info!(id, processor, "需求已标记为已处理");
        Ok(())
    }

    /// 批量完成
    ///
    /// # 返回
    /// - Ok(usize): 实际完成的条数（已处理的需求不重复计数）
    pub fn batch_complete(
        &self,
        ids: &[i64],
        processor: &str,
        now: NaiveDateTime,
    ) -> ApiResult<usize> {
        let processor = require_processor(processor)?;
        let count = self.requirements.batch_complete(ids, processor, now)?;
        tracing::info!(requested = ids.len(), completed = count, processor, "批量完成需求");
        Ok(count)
    }

    /// 导出需求列表（含表头行）
    pub fn export_rows(&self, filter: &RequirementFilter) -> ApiResult<Vec<Vec<String>>> {
        let requirements = self.requirements.query(filter)?;
        let builder = ExportRowBuilder::new(&self.settings.name_column, &self.settings.ip_column);
        Ok(builder.requirement_rows(&requirements))
    }
}

fn require_processor(processor: &str) -> ApiResult<&str> {
    let processor = processor.trim();
    if processor.is_empty() {
        return Err(ApiError::InvalidInput("处理人不能为空".to_string()));
    }
    Ok(processor)
}
