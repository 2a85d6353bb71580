// ==========================================
// UCM需求登记系统 - 上传文件解析器
// ==========================================
// 职责: 把上传文件转换为原始二维单元格（第一行为表头）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 红线: 只做格式转换，不做列比对、不做校验
// ==========================================

use crate::domain::upload::UploadTable;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// UploadParser Trait
// ==========================================
pub trait UploadParser {
    /// 解析文件为上传表格
    ///
    /// # 返回
    /// - UploadTable: 表头 + 数据行（完全空白的数据行已跳过）
    fn parse_table(&self, file_path: &Path) -> ImportResult<UploadTable>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl UploadParser for CsvParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<UploadTable> {
        ensure_exists(file_path)?;

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut cells = Vec::new();
        for result in reader.records() {
            let record = result?;
            cells.push(record.iter().map(|v| v.to_string()).collect::<Vec<_>>());
        }

        // Excel 另存的 CSV 常带 BOM
        if let Some(first) = cells.first_mut().and_then(|row| row.first_mut()) {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }

        Ok(build_table(cells))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl UploadParser for ExcelParser {
    fn parse_table(&self, file_path: &Path) -> ImportResult<UploadTable> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let cells = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        Ok(build_table(cells))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    max_bytes: u64,
}

impl UniversalFileParser {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<UploadTable> {
        let path = file_path.as_ref();
        ensure_exists(path)?;

        let size = std::fs::metadata(path)?.len();
        if size > self.max_bytes {
            return Err(ImportError::FileTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let table = match ext.as_str() {
            "csv" => CsvParser.parse_table(path)?,
            "xlsx" | "xls" => ExcelParser.parse_table(path)?,
            _ => return Err(ImportError::UnsupportedFormat(ext)),
        };

        tracing::debug!(
            file = %path.display(),
            columns = table.headers.len(),
            rows = table.row_count(),
            "上传文件解析完成"
        );
        Ok(table)
    }
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 第一行作为表头，跳过完全空白的数据行
fn build_table(cells: Vec<Vec<String>>) -> UploadTable {
    let mut table = UploadTable::from_cells(cells);
    table
        .rows
        .retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file("名称,IP,备注\nR1,1.1.1.1,\nR2,2.2.2.2,核心\n");
        let table = CsvParser.parse_table(temp_file.path()).unwrap();
        assert_eq!(table.headers, vec!["名称", "IP", "备注"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1][2], "核心");
    }

    #[test]
    fn test_csv_parser_skips_blank_rows_and_bom() {
        let temp_file = csv_file("\u{feff}名称,IP\n,\nR1,1.1.1.1\n  , \n");
        let table = CsvParser.parse_table(temp_file.path()).unwrap();
        assert_eq!(table.headers[0], "名称");
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_csv_parser_flexible_rows() {
        let temp_file = csv_file("名称,IP\nR1\nR2,2.2.2.2,extra\n");
        let table = CsvParser.parse_table(temp_file.path()).unwrap();
        assert_eq!(table.rows[0], vec!["R1"]);
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_file_not_found() {
        let result = UniversalFileParser::new(1024).parse("/nonexistent/upload.csv");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let mut temp_file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(temp_file, "名称,IP").unwrap();
        let result = UniversalFileParser::new(1024).parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_file_too_large() {
        let temp_file = csv_file("名称,IP\nR1,1.1.1.1\n");
        let result = UniversalFileParser::new(4).parse(temp_file.path());
        assert!(matches!(result, Err(ImportError::FileTooLarge { limit: 4, .. })));
    }
}
