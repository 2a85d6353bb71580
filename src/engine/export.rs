// ==========================================
// UCM需求登记系统 - 导出行构造
// ==========================================
// 职责: 生成需求列表导出 / 模板下载的二维行数据
// 说明: 只负责逻辑行，文件格式渲染由外部完成
// ==========================================

use crate::domain::requirement::{Record, StoredRequirement};
use crate::domain::template::Schema;

/// 需求列表导出表头
pub const EXPORT_HEADERS: [&str; 11] = [
    "需求ID",
    "需求类型",
    "名称",
    "IP地址",
    "UCM变更日期",
    "提交人",
    "提交时间",
    "状态",
    "处理人",
    "处理时间",
    "需求详情",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct ExportRowBuilder {
    name_column: String,
    ip_column: String,
}

impl ExportRowBuilder {
    pub fn new(name_column: impl Into<String>, ip_column: impl Into<String>) -> Self {
        Self {
            name_column: name_column.into(),
            ip_column: ip_column.into(),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        EXPORT_HEADERS.iter().map(|h| h.to_string()).collect()
    }

    /// 单条需求的导出行
    pub fn requirement_row(&self, requirement: &StoredRequirement) -> Vec<String> {
        vec![
            requirement.id.to_string(),
            requirement.requirement_type.display_name().to_string(),
            requirement.device_name.clone(),
            requirement.ip.clone(),
            requirement.ucm_change_date.format(DATE_FORMAT).to_string(),
            requirement.submitter.clone(),
            requirement.submit_time.format(DATETIME_FORMAT).to_string(),
            requirement.status.display_name().to_string(),
            requirement.processor.clone().unwrap_or_default(),
            requirement
                .process_time
                .map(|t| t.format(DATETIME_FORMAT).to_string())
                .unwrap_or_default(),
            self.detail_text(&requirement.data),
        ]
    }

    /// 表头 + 全部数据行
    pub fn requirement_rows(&self, requirements: &[StoredRequirement]) -> Vec<Vec<String>> {
        std::iter::once(self.headers())
            .chain(requirements.iter().map(|r| self.requirement_row(r)))
            .collect()
    }

    /// 需求详情: "列: 值" 以 "; " 连接，不含名称和 IP 列
    pub fn detail_text(&self, data: &Record) -> String {
        data.iter()
            .filter(|(key, _)| *key != self.name_column && *key != self.ip_column)
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// 模板下载: 列名行 + 示例行
    pub fn template_rows(schema: &Schema) -> Vec<Vec<String>> {
        let header = schema.names().map(str::to_string).collect();
        let example = schema.columns().iter().map(|c| c.example.clone()).collect();
        vec![header, example]
    }
}
