// ==========================================
// UCM需求登记系统 - 工作批次
// ==========================================
// 职责: 单个会话独占的待提交记录集合（增 / 删 / 复制 / 编辑 / 整体替换）
// 红线: 每次变更后对应行立即重新校验；批次不落库，放弃即丢弃
// ==========================================

use crate::domain::requirement::{Record, ValidationResult};
use crate::domain::types::RecordType;
use crate::engine::context::EngineContext;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use serde::Serialize;

/// 批次中的一行
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub id: u64,
    pub record: Record,
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct Batch {
    record_type: RecordType,
    change_date: Option<NaiveDate>,
    rows: Vec<BatchRow>,
    next_row_id: u64,
}

impl Batch {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            change_date: None,
            rows: Vec::new(),
            next_row_id: 1,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn change_date(&self) -> Option<NaiveDate> {
        self.change_date
    }

    pub fn set_change_date(&mut self, date: Option<NaiveDate>) {
        self.change_date = date;
    }

    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    pub fn row(&self, row_id: u64) -> Option<&BatchRow> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (行ID, 记录) 迭代
    pub fn records(&self) -> impl Iterator<Item = (u64, &Record)> {
        self.rows.iter().map(|r| (r.id, &r.record))
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_row_id;
        self.next_row_id += 1;
        id
    }

    fn position(&self, row_id: u64) -> EngineResult<usize> {
        self.rows
            .iter()
            .position(|r| r.id == row_id)
            .ok_or(EngineError::RowNotFound(row_id))
    }

    /// 新增空行
    ///
    /// 所有模板列置空；只有一个可选值的列自动填入该值
    ///
    /// # 返回
    /// - 新行ID
    pub fn add_row(&mut self, ctx: &EngineContext) -> u64 {
        let mut record = Record::for_schema(ctx.schema());
        for name in ctx.schema().names() {
            if let Some(value) = ctx.options().single_value(name) {
                record.set(name, value);
            }
        }

        let validation = ctx.validator().validate(&record);
        let id = self.allocate_id();
        self.rows.push(BatchRow {
            id,
            record,
            validation,
        });
        id
    }

    /// 复制行（新ID，数据与校验结果相同），追加到批次末尾
    pub fn copy_row(&mut self, row_id: u64) -> EngineResult<u64> {
        let idx = self.position(row_id)?;
        let mut copy = self.rows[idx].clone();
        copy.id = self.allocate_id();
        let new_id = copy.id;
        self.rows.push(copy);
        Ok(new_id)
    }

    /// 移除指定行，不存在的ID忽略
    ///
    /// # 返回
    /// - 实际移除的行数
    pub fn remove_rows(&mut self, row_ids: &[u64]) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| !row_ids.contains(&r.id));
        before - self.rows.len()
    }

    pub fn remove_row(&mut self, row_id: u64) -> EngineResult<BatchRow> {
        let idx = self.position(row_id)?;
        Ok(self.rows.remove(idx))
    }

    /// 编辑单元格并重新校验该行
    pub fn edit_cell(
        &mut self,
        ctx: &EngineContext,
        row_id: u64,
        column: &str,
        value: impl Into<String>,
    ) -> EngineResult<&ValidationResult> {
        if !ctx.schema().contains(column) {
            return Err(EngineError::UnknownColumn(column.to_string()));
        }
        let idx = self.position(row_id)?;
        let row = &mut self.rows[idx];
        row.record.set(column, value);
        row.validation = ctx.validator().validate(&row.record);
        Ok(&row.validation)
    }

    /// 以上传对账结果整体替换批次内容
    ///
    /// # 返回
    /// - 新行ID列表（与输入顺序一致）
    pub fn replace_rows(&mut self, ctx: &EngineContext, records: Vec<Record>) -> Vec<u64> {
        self.rows.clear();
        records
            .into_iter()
            .map(|mut record| {
                record.fill_missing(ctx.schema());
                let validation = ctx.validator().validate(&record);
                let id = self.allocate_id();
                self.rows.push(BatchRow {
                    id,
                    record,
                    validation,
                });
                id
            })
            .collect()
    }

    /// 按给定上下文重新校验全部行
    ///
    /// # 返回
    /// - 未通过校验的行数
    pub fn validate_all(&mut self, ctx: &EngineContext) -> usize {
        let validator = ctx.validator();
        for row in &mut self.rows {
            row.record.fill_missing(ctx.schema());
            row.validation = validator.validate(&row.record);
        }
        self.invalid_row_ids().len()
    }

    pub fn all_valid(&self) -> bool {
        self.rows.iter().all(|r| r.validation.is_valid())
    }

    pub fn invalid_row_ids(&self) -> Vec<u64> {
        self.rows
            .iter()
            .filter(|r| !r.validation.is_valid())
            .map(|r| r.id)
            .collect()
    }
}
