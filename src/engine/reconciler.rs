// ==========================================
// UCM需求登记系统 - 上传对账
// ==========================================
// 职责: 比对上传表头与模板列，一致时把数据行映射为记录
// 流程:
// 1. 行数上限检查（先于列比对）
// 2. missing = 模板列 − 表头, extra = 表头 − 模板列（trim 后精确匹配）
// 3. 任一非空即整体失败，不做部分映射 / 模糊匹配
// 4. 每行单元格 trim 后按表头列名写入记录；同名列后者覆盖前者
// ==========================================

use crate::domain::requirement::Record;
use crate::domain::template::Schema;
use crate::domain::upload::UploadTable;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 列差异
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiff {
    pub missing: BTreeSet<String>,
    pub extra: BTreeSet<String>,
}

impl ColumnDiff {
    pub fn is_match(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

pub struct BatchReconciler {
    max_rows: usize,
}

impl BatchReconciler {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// 计算列差异（集合差，表头重复出现的列名只计一次）
    pub fn reconcile(&self, header: &[String], schema: &Schema) -> ColumnDiff {
        let seen: BTreeSet<&str> = header.iter().map(|h| h.trim()).collect();

        let extra = seen
            .iter()
            .filter(|name| !schema.contains(name))
            .map(|name| name.to_string())
            .collect();

        let missing = schema
            .names()
            .filter(|name| !seen.contains(name))
            .map(str::to_string)
            .collect();

        ColumnDiff { missing, extra }
    }

    /// 把数据行映射为记录（调用前须确认列一致）
    ///
    /// 行短于表头时缺失单元格记为空字符串；超出表头的单元格忽略；
    /// 同名列重复出现时以最后一列为准
    pub fn map_rows(&self, rows: &[Vec<String>], header: &[String]) -> Vec<Record> {
        rows.iter()
            .map(|row| {
                Record::from_pairs(header.iter().enumerate().map(|(idx, name)| {
                    let value = row.get(idx).map(|c| c.trim()).unwrap_or("");
                    (name.trim().to_string(), value.to_string())
                }))
            })
            .collect()
    }

    /// 完整对账: 行数上限 → 列比对 → 行映射
    pub fn reconcile_upload(&self, table: &UploadTable, schema: &Schema) -> EngineResult<Vec<Record>> {
        if !table.has_headers() || table.rows.is_empty() {
            return Err(EngineError::EmptyUpload);
        }

        if table.row_count() > self.max_rows {
            tracing::warn!(
                rows = table.row_count(),
                limit = self.max_rows,
                "上传数据超出行数上限"
            );
            return Err(EngineError::RowLimitExceeded {
                count: table.row_count(),
                limit: self.max_rows,
            });
        }

        let diff = self.reconcile(&table.headers, schema);
        if !diff.is_match() {
            tracing::warn!(
                missing = ?diff.missing,
                extra = ?diff.extra,
                "上传列与模板不一致"
            );
            return Err(EngineError::SchemaMismatch {
                missing: diff.missing,
                extra: diff.extra,
            });
        }

        let records = self.map_rows(&table.rows, &table.headers);
        tracing::debug!(rows = records.len(), "上传对账通过");
        Ok(records)
    }
}
