// ==========================================
// UCM需求登记系统 - 需求记录领域模型
// ==========================================
// 职责: 记录 / 字段校验结果 / 提交单元 / 已登记需求
// ==========================================

use crate::domain::template::Schema;
use crate::domain::types::{RecordType, RequirementStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==========================================
// Record - 列名 → 单元格值
// ==========================================
// 工作集中的记录: 模板中每一列都存在（可能为空字符串）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按模板创建空记录（所有列为空字符串）
    pub fn for_schema(schema: &Schema) -> Self {
        Self {
            values: schema
                .names()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// 取值并 trim；缺失列视为空
    pub fn trimmed(&self, name: &str) -> &str {
        self.get(name).map(str::trim).unwrap_or("")
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 补齐模板中缺失的列
    pub fn fill_missing(&mut self, schema: &Schema) {
        for name in schema.names() {
            self.values.entry(name.to_string()).or_default();
        }
    }

    /// 按模板列顺序输出 (列名, 值)
    pub fn ordered(&self, schema: &Schema) -> Vec<(String, String)> {
        schema
            .names()
            .map(|name| (name.to_string(), self.get(name).unwrap_or("").to_string()))
            .collect()
    }
}

// ==========================================
// 字段校验错误
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// 必填字段为空
    Required,
    /// IPv4 格式错误
    InvalidIpv4,
    /// 不在可选值清单中
    NotInOptions,
    /// 上级已选择，本级未选择
    SelectionRequired,
    /// 目录中不存在该值
    UnrecognizedValue,
    /// 与上级选择不匹配
    NotValidForParent,
    /// 设备类型/厂商/版本组合不存在
    InvalidCombination,
    /// 认证方式不属于所选版本
    AuthMethodMismatch,
}

impl ValidationErrorKind {
    /// i18n 键
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationErrorKind::Required => "validation.required",
            ValidationErrorKind::InvalidIpv4 => "validation.invalid_ipv4",
            ValidationErrorKind::NotInOptions => "validation.not_in_options",
            ValidationErrorKind::SelectionRequired => "validation.selection_required",
            ValidationErrorKind::UnrecognizedValue => "validation.unrecognized_value",
            ValidationErrorKind::NotValidForParent => "validation.not_valid_for_parent",
            ValidationErrorKind::InvalidCombination => "validation.invalid_combination",
            ValidationErrorKind::AuthMethodMismatch => "validation.auth_method_mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl FieldError {
    /// 使用当前语言生成提示文本
    pub fn new(kind: ValidationErrorKind) -> Self {
        Self {
            kind,
            message: crate::i18n::t(kind.message_key()),
        }
    }
}

// ==========================================
// ValidationResult
// ==========================================
// 不变量: is_valid == errors.is_empty()
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    is_valid: bool,
    errors: BTreeMap<String, FieldError>,
    /// 预留，目前没有规则产生警告
    warnings: BTreeMap<String, FieldError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: BTreeMap::new(),
            warnings: BTreeMap::new(),
        }
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录列错误；每列只保留第一条错误，返回是否写入
    pub fn add_error(&mut self, column: &str, kind: ValidationErrorKind) -> bool {
        if self.errors.contains_key(column) {
            return false;
        }
        self.errors.insert(column.to_string(), FieldError::new(kind));
        self.is_valid = false;
        true
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &BTreeMap<String, FieldError> {
        &self.errors
    }

    pub fn warnings(&self) -> &BTreeMap<String, FieldError> {
        &self.warnings
    }

    pub fn error_for(&self, column: &str) -> Option<&FieldError> {
        self.errors.get(column)
    }

    pub fn error_kind(&self, column: &str) -> Option<ValidationErrorKind> {
        self.errors.get(column).map(|e| e.kind)
    }
}

// ==========================================
// DuplicateKey - 名称 + IP
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub name: String,
    pub ip: String,
}

impl DuplicateKey {
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
        }
    }
}

// ==========================================
// 提交单元
// ==========================================

/// 最终确认的单条需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedRecord {
    pub requirement_type: RecordType,
    pub ucm_change_date: NaiveDate,
    pub submitter_name: String,
    pub device_name: String,
    pub ip: String,
    pub data: Record,
}

/// 交给持久化协作方的提交单元
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitUnit {
    pub commit_id: Uuid,
    pub record_type: RecordType,
    pub change_date: NaiveDate,
    pub submitter: String,
    pub assembled_at: NaiveDateTime,
    pub records: Vec<FinalizedRecord>,
    /// 因与待处理需求重复而跳过的记录
    pub skipped_duplicates: Vec<DuplicateKey>,
}

impl CommitUnit {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ==========================================
// StoredRequirement - 已登记需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRequirement {
    pub id: i64,
    pub requirement_type: RecordType,
    pub ucm_change_date: NaiveDate,
    pub submitter: String,
    pub submit_time: NaiveDateTime,
    pub status: RequirementStatus,
    pub processor: Option<String>,
    pub process_time: Option<NaiveDateTime>,
    pub device_name: String,
    pub ip: String,
    pub data: Record,
    pub note: Option<String>,
}

impl StoredRequirement {
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey::new(self.device_name.clone(), self.ip.clone())
    }
}
