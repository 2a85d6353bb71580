// ==========================================
// UCM需求登记系统 - 上传表格
// ==========================================
// 上传来源交付的二维单元格数组（第一行为表头）
// 引擎不解析任何二进制表格格式
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UploadTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// 从原始二维数组构造；第一行视为表头
    pub fn from_cells(mut cells: Vec<Vec<String>>) -> Self {
        if cells.is_empty() {
            return Self::default();
        }
        let headers = cells.remove(0);
        Self {
            headers,
            rows: cells,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_headers(&self) -> bool {
        self.headers.iter().any(|h| !h.trim().is_empty())
    }
}
