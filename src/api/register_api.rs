// ==========================================
// UCM需求登记系统 - 需求登记 API
// ==========================================
// 职责: 加载会话上下文，驱动工作批次的编辑 / 上传 / 校验 / 重复检查 / 提交
// 红线:
// - 外部调用失败时工作批次保持原样，可直接重试
// - 同一会话同一时刻只允许一个全量校验或提交请求；请求处理期间拒绝批次编辑
// - 上下文不可变，重新加载生成新上下文并重新校验批次
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{DeadlineConfigReader, EngineSettings};
use crate::domain::requirement::{DuplicateKey, ValidationResult};
use crate::domain::types::RecordType;
use crate::domain::upload::UploadTable;
use crate::engine::{
    Batch, BatchReconciler, DateGate, DuplicateGate, EligibleDate, EngineContext, EngineError,
    ExportRowBuilder, SubmissionAssembler,
};
use crate::importer::UniversalFileParser;
use crate::repository::{CatalogSource, RequirementStore, TemplateSource};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// 返回类型
// ==========================================

/// 全量校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub invalid_rows: Vec<u64>,
}

impl ValidationSummary {
    pub fn all_valid(&self) -> bool {
        self.invalid_rows.is_empty()
    }
}

/// 重复检查结果（仅提示，不阻断）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    /// 与同日期待处理需求重复的键
    pub pending: BTreeSet<DuplicateKey>,
    /// 批次内重复的行（不含第一次出现）
    pub within_batch: Vec<(u64, DuplicateKey)>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.within_batch.is_empty()
    }
}

/// 提交回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub commit_id: Uuid,
    pub requirement_ids: Vec<i64>,
    pub skipped_duplicates: Vec<DuplicateKey>,
}

// ==========================================
// RegisterApi - 协作方装配
// ==========================================

#[derive(Clone)]
pub struct RegisterApi {
    templates: Arc<dyn TemplateSource>,
    catalog: Arc<dyn CatalogSource>,
    deadline: Arc<dyn DeadlineConfigReader>,
    store: Arc<dyn RequirementStore>,
    settings: EngineSettings,
}

impl RegisterApi {
    pub fn new(
        templates: Arc<dyn TemplateSource>,
        catalog: Arc<dyn CatalogSource>,
        deadline: Arc<dyn DeadlineConfigReader>,
        store: Arc<dyn RequirementStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            templates,
            catalog,
            deadline,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// 并发加载模板 / 可选值 / 目录 / 截止配置，组装会话上下文
    ///
    /// # 参数
    /// - `record_type`: 需求类型
    /// - `now`: 加载时刻
    ///
    /// # 返回
    /// - Err(UpstreamUnavailable): 任一协作方调用失败
    /// - Err(Engine(Template / DeadlineConfig)): 已存储的模板或截止配置本身不合法
    #[instrument(skip(self), fields(record_type = %record_type))]
    pub async fn load_context(
        &self,
        record_type: RecordType,
        now: NaiveDateTime,
    ) -> ApiResult<EngineContext> {
        let result = futures::try_join!(
            self.templates.load_templates(),
            self.catalog.load_options(),
            self.catalog.load_hierarchy(),
            self.deadline.read_deadline_config(),
        );

        let (templates, options, hierarchy, deadline) = result.map_err(|e| {
            tracing::warn!(error = %e, "会话上下文加载失败");
            ApiError::from(e)
        })?;

        let ctx = EngineContext::new(
            record_type,
            &templates,
            options,
            hierarchy,
            deadline,
            self.settings.clone(),
            now,
        );
        tracing::info!(columns = ctx.schema().len(), "会话上下文已加载");
        Ok(ctx)
    }

    /// 可登记的UCM变更日期（含截止时间展示文本）
    #[instrument(skip(self))]
    pub async fn available_dates(&self, now: NaiveDateTime) -> ApiResult<Vec<EligibleDate>> {
        let config = self.deadline.read_deadline_config().await?;
        Ok(DateGate::eligible_dates(
            now,
            &config,
            self.settings.eligible_horizon_days,
        ))
    }

    /// 模板下载内容: 表头行 + 示例行
    #[instrument(skip(self), fields(record_type = %record_type))]
    pub async fn template_rows(&self, record_type: RecordType) -> ApiResult<Vec<Vec<String>>> {
        let templates = self.templates.load_templates().await?;
        Ok(ExportRowBuilder::template_rows(
            templates.effective_schema(record_type),
        ))
    }

    /// 打开登记会话
    ///
    /// # 参数
    /// - `record_type`: 需求类型
    /// - `submitter`: 提交人
    /// - `now`: 当前时间
    pub async fn open_session(
        &self,
        record_type: RecordType,
        submitter: impl Into<String>,
        now: NaiveDateTime,
    ) -> ApiResult<RegisterSession> {
        let ctx = self.load_context(record_type, now).await?;
        Ok(RegisterSession {
            api: self.clone(),
            submitter: submitter.into(),
            context: Mutex::new(Arc::new(ctx)),
            batch: Mutex::new(Batch::new(record_type)),
            in_flight: AtomicBool::new(false),
        })
    }
}

// ==========================================
// 单请求守卫
// ==========================================

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, action: &'static str) -> ApiResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                tracing::debug!(action, "请求处理中，忽略重复请求");
                ApiError::Engine(EngineError::RequestInFlight(action))
            })?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ==========================================
// RegisterSession - 单个操作员的登记会话
// ==========================================

pub struct RegisterSession {
    api: RegisterApi,
    submitter: String,
    context: Mutex<Arc<EngineContext>>,
    batch: Mutex<Batch>,
    in_flight: AtomicBool,
}

impl RegisterSession {
    fn lock_batch(&self) -> ApiResult<MutexGuard<'_, Batch>> {
        self.batch
            .lock()
            .map_err(|e| ApiError::InternalError(format!("批次锁获取失败: {}", e)))
    }

    /// 获取批次锁用于编辑；全量校验或提交处理中时拒绝
    ///
    /// 在持有批次锁时检查标志，保证提交取快照之后不会再有编辑写入
    fn lock_batch_for_edit(&self, action: &'static str) -> ApiResult<MutexGuard<'_, Batch>> {
        let batch = self.lock_batch()?;
        if self.is_busy() {
            tracing::debug!(action, "请求处理中，拒绝编辑批次");
            return Err(EngineError::RequestInFlight(action).into());
        }
        Ok(batch)
    }

    /// 当前上下文快照
    pub fn context(&self) -> ApiResult<Arc<EngineContext>> {
        self.context
            .lock()
            .map(|ctx| Arc::clone(&*ctx))
            .map_err(|e| ApiError::InternalError(format!("上下文锁获取失败: {}", e)))
    }

    fn replace_context(&self, ctx: Arc<EngineContext>) -> ApiResult<()> {
        let mut guard = self
            .context
            .lock()
            .map_err(|e| ApiError::InternalError(format!("上下文锁获取失败: {}", e)))?;
        *guard = ctx;
        Ok(())
    }

    pub fn submitter(&self) -> &str {
        &self.submitter
    }

    pub fn record_type(&self) -> ApiResult<RecordType> {
        Ok(self.lock_batch()?.record_type())
    }

    /// 批次快照（用于展示）
    pub fn batch_snapshot(&self) -> ApiResult<Batch> {
        Ok(self.lock_batch()?.clone())
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 当前上下文中某版本可选的认证方式（供下拉选择）
    pub fn login_methods(
        &self,
        device_type: &str,
        manufacturer: &str,
        version: &str,
    ) -> ApiResult<Vec<String>> {
        let ctx = self.context()?;
        Ok(ctx
            .hierarchy()
            .login_methods(device_type.trim(), manufacturer.trim(), version.trim())
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    // ==========================================
    // 工作批次编辑
    // ==========================================

    pub fn add_row(&self) -> ApiResult<u64> {
        let ctx = self.context()?;
        Ok(self.lock_batch_for_edit("add_row")?.add_row(&ctx))
    }

    pub fn copy_row(&self, row_id: u64) -> ApiResult<u64> {
        Ok(self.lock_batch_for_edit("copy_row")?.copy_row(row_id)?)
    }

    pub fn remove_row(&self, row_id: u64) -> ApiResult<()> {
        self.lock_batch_for_edit("remove_row")?.remove_row(row_id)?;
        Ok(())
    }

    /// 编辑单元格，返回该行最新校验结果
    pub fn edit_cell(
        &self,
        row_id: u64,
        column: &str,
        value: impl Into<String>,
    ) -> ApiResult<ValidationResult> {
        let ctx = self.context()?;
        let mut batch = self.lock_batch_for_edit("edit_cell")?;
        Ok(batch.edit_cell(&ctx, row_id, column, value)?.clone())
    }

    /// 选择UCM变更日期
    ///
    /// 不可登记的日期直接拒绝，不做替换
    pub fn set_change_date(&self, date: Option<NaiveDate>, now: NaiveDateTime) -> ApiResult<()> {
        if let Some(date) = date {
            let ctx = self.context()?;
            if !DateGate::is_date_eligible(date, ctx.deadline(), now) {
                return Err(EngineError::IneligibleDate { date }.into());
            }
        }
        self.lock_batch_for_edit("set_change_date")?
            .set_change_date(date);
        Ok(())
    }

    // ==========================================
    // 上传
    // ==========================================

    /// 用上传表格整体替换批次
    ///
    /// 列不一致 / 超出行数时整批拒绝，批次保持原样
    pub fn import_upload(&self, table: &UploadTable) -> ApiResult<Vec<u64>> {
        let ctx = self.context()?;
        let records = BatchReconciler::new(ctx.settings().max_upload_rows)
            .reconcile_upload(table, ctx.schema())?;

        let mut batch = self.lock_batch_for_edit("import_upload")?;
        let ids = batch.replace_rows(&ctx, records);
        tracing::info!(
            rows = ids.len(),
            invalid = batch.invalid_row_ids().len(),
            "上传数据已载入批次"
        );
        Ok(ids)
    }

    /// 解析上传文件并载入批次
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> ApiResult<Vec<u64>> {
        let ctx = self.context()?;
        let table = UniversalFileParser::new(ctx.settings().max_upload_bytes).parse(path)?;
        self.import_upload(&table)
    }

    // ==========================================
    // 校验 / 重新加载
    // ==========================================

    /// 仅用当前上下文重新校验批次（不访问协作方）
    pub fn revalidate(&self) -> ApiResult<ValidationSummary> {
        let ctx = self.context()?;
        let mut batch = self.lock_batch()?;
        batch.validate_all(&ctx);
        Ok(ValidationSummary {
            total: batch.len(),
            invalid_rows: batch.invalid_row_ids(),
        })
    }

    /// 重新加载上下文并全量校验
    ///
    /// 加载失败时保留旧上下文和批次
    #[instrument(skip(self))]
    pub async fn validate_all(&self, now: NaiveDateTime) -> ApiResult<ValidationSummary> {
        let _guard = InFlightGuard::acquire(&self.in_flight, "validate_all")?;
        self.reload_context(now).await?;
        let summary = self.revalidate()?;
        tracing::info!(
            total = summary.total,
            invalid = summary.invalid_rows.len(),
            "全量校验完成"
        );
        Ok(summary)
    }

    /// 重新加载上下文（模板 / 可选值 / 截止配置变化后调用）
    pub async fn reload(&self, now: NaiveDateTime) -> ApiResult<ValidationSummary> {
        self.validate_all(now).await
    }

    async fn reload_context(&self, now: NaiveDateTime) -> ApiResult<()> {
        let record_type = self.record_type()?;
        let ctx = self.api.load_context(record_type, now).await?;
        self.replace_context(Arc::new(ctx))
    }

    // ==========================================
    // 重复检查 / 提交
    // ==========================================

    /// 检查批次与同日期待处理需求、以及批次内部的重复
    #[instrument(skip(self))]
    pub async fn check_duplicates(&self) -> ApiResult<DuplicateReport> {
        let ctx = self.context()?;
        let batch = self.batch_snapshot()?;
        let date = batch.change_date().ok_or(EngineError::ChangeDateMissing)?;

        let existing = self.api.store.list_pending_by_date(date).await?;

        let settings = ctx.settings();
        let gate = DuplicateGate::new(&settings.name_column, &settings.ip_column);
        let candidates: Vec<_> = batch.records().map(|(_, r)| r.clone()).collect();
        let report = DuplicateReport {
            pending: gate.check_duplicates(&candidates, &existing),
            within_batch: gate.within_batch(batch.records()),
        };

        if !report.is_empty() {
            tracing::info!(
                pending = report.pending.len(),
                within_batch = report.within_batch.len(),
                "发现重复记录"
            );
        }
        Ok(report)
    }

    /// 提交批次
    ///
    /// # 参数
    /// - `now`: 当前时间（用于日期闸门）
    /// - `skip_keys`: 确认跳过的重复键（通常来自 check_duplicates）
    ///
    /// # 返回
    /// - Ok(SubmitReceipt): 提交成功，移除参与本次提交的行（保留需求类型与变更日期）
    /// - Err: 批次保持原样
    #[instrument(skip(self, skip_keys), fields(submitter = %self.submitter))]
    pub async fn submit(
        &self,
        now: NaiveDateTime,
        skip_keys: &BTreeSet<DuplicateKey>,
    ) -> ApiResult<SubmitReceipt> {
        let _guard = InFlightGuard::acquire(&self.in_flight, "submit")?;

        let ctx = self.context()?;
        let batch = self.batch_snapshot()?;
        let unit = SubmissionAssembler::new(&ctx).assemble(
            &batch,
            batch.change_date(),
            ctx.record_type(),
            &self.submitter,
            now,
            skip_keys,
        )?;

        let ids = self.api.store.submit_batch(&unit).await.map_err(|e| {
            tracing::warn!(commit_id = %unit.commit_id, error = %e, "需求提交失败，批次保持不变");
            ApiError::from(e)
        })?;

        let submitted_rows: Vec<u64> = batch.rows().iter().map(|r| r.id).collect();
        self.lock_batch()?.remove_rows(&submitted_rows);

        tracing::info!(
            commit_id = %unit.commit_id,
            submitted = ids.len(),
            skipped = unit.skipped_duplicates.len(),
            "需求提交成功"
        );
        Ok(SubmitReceipt {
            commit_id: unit.commit_id,
            requirement_ids: ids,
            skipped_duplicates: unit.skipped_duplicates,
        })
    }
}
