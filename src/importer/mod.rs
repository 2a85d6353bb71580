// ==========================================
// UCM需求登记系统 - 上传来源层
// ==========================================
// 职责: 外部上传文件 → 原始二维单元格
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser, UploadParser};
