// ==========================================
// UCM需求登记系统 - 模板（列定义）领域模型
// ==========================================
// 职责: 列定义 / 模板 / 模板集合
// 红线: 列名在同一模板内唯一；列只能通过显式管理操作增删改
// ==========================================

use crate::domain::types::RecordType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 模板编辑错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("列名不能为空")]
    EmptyColumnName,

    #[error("列名重复: {0}")]
    DuplicateColumn(String),

    #[error("列不存在: index={0}")]
    ColumnIndexOutOfRange(usize),

    #[error("模板配置格式错误: {0}")]
    MalformedDefinition(String),
}

// ==========================================
// ColumnDefinition - 列定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub example: String,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, required: bool, example: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required,
            example: example.into(),
        }
    }

    /// 旧格式（仅列名）转换：非必填、无示例
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, false, "")
    }
}

/// 列移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

// ==========================================
// Schema - 某一需求类型的有序列定义
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColumnDefinition>", into = "Vec<ColumnDefinition>")]
pub struct Schema {
    columns: Vec<ColumnDefinition>,
}

impl Schema {
    /// 构造模板（列名 trim 后校验非空且唯一）
    pub fn new(columns: Vec<ColumnDefinition>) -> Result<Self, TemplateError> {
        let mut schema = Schema::default();
        for column in columns {
            schema.add_column(column)?;
        }
        Ok(schema)
    }

    /// 仅由列名构造（全部非必填）
    pub fn from_names<I, S>(names: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(ColumnDefinition::optional).collect())
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    // ===== 管理操作 =====

    /// 追加列
    pub fn add_column(&mut self, column: ColumnDefinition) -> Result<(), TemplateError> {
        let column = normalize_column(column)?;
        if self.contains(&column.name) {
            return Err(TemplateError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// 编辑列（允许改名，但不能与其他列重名）
    pub fn edit_column(
        &mut self,
        index: usize,
        column: ColumnDefinition,
    ) -> Result<(), TemplateError> {
        if index >= self.columns.len() {
            return Err(TemplateError::ColumnIndexOutOfRange(index));
        }
        let column = normalize_column(column)?;
        let clash = self
            .columns
            .iter()
            .enumerate()
            .any(|(i, c)| i != index && c.name == column.name);
        if clash {
            return Err(TemplateError::DuplicateColumn(column.name));
        }
        self.columns[index] = column;
        Ok(())
    }

    /// 删除列
    pub fn remove_column(&mut self, index: usize) -> Result<ColumnDefinition, TemplateError> {
        if index >= self.columns.len() {
            return Err(TemplateError::ColumnIndexOutOfRange(index));
        }
        Ok(self.columns.remove(index))
    }

    /// 上移 / 下移一位；已在边界时不做变化
    pub fn move_column(
        &mut self,
        index: usize,
        direction: MoveDirection,
    ) -> Result<(), TemplateError> {
        if index >= self.columns.len() {
            return Err(TemplateError::ColumnIndexOutOfRange(index));
        }
        match direction {
            MoveDirection::Up if index > 0 => self.columns.swap(index - 1, index),
            MoveDirection::Down if index + 1 < self.columns.len() => {
                self.columns.swap(index, index + 1)
            }
            _ => {}
        }
        Ok(())
    }

    // ===== 存储格式 =====

    /// 解析存储的列定义
    ///
    /// 兼容三种历史格式:
    /// - 对象数组: `[{"name":"名称","required":true,"example":"R1"}]`
    /// - 字符串数组: `["名称","IP"]`
    /// - 逗号分隔字符串: `名称,IP`
    pub fn from_stored(raw: &str) -> Result<Self, TemplateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Schema::default());
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Array(items)) => {
                let mut columns = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(name) => {
                            columns.push(ColumnDefinition::optional(name))
                        }
                        other => {
                            let column: ColumnDefinition = serde_json::from_value(other)
                                .map_err(|e| TemplateError::MalformedDefinition(e.to_string()))?;
                            columns.push(column);
                        }
                    }
                }
                Schema::new(columns)
            }
            Ok(other) => Err(TemplateError::MalformedDefinition(format!(
                "期望数组，实际为 {}",
                other
            ))),
            Err(_) => Schema::from_names(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            ),
        }
    }

    /// 序列化为存储格式（对象数组）
    pub fn to_stored(&self) -> String {
        // Vec<ColumnDefinition> 的序列化不会失败
        serde_json::to_string(&self.columns).unwrap_or_else(|_| "[]".to_string())
    }
}

impl TryFrom<Vec<ColumnDefinition>> for Schema {
    type Error = TemplateError;

    fn try_from(columns: Vec<ColumnDefinition>) -> Result<Self, Self::Error> {
        Schema::new(columns)
    }
}

impl From<Schema> for Vec<ColumnDefinition> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}

fn normalize_column(mut column: ColumnDefinition) -> Result<ColumnDefinition, TemplateError> {
    column.name = column.name.trim().to_string();
    if column.name.is_empty() {
        return Err(TemplateError::EmptyColumnName);
    }
    Ok(column)
}

// ==========================================
// TemplateSet - 三类需求模板 + 模板解析规则
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub import: Schema,
    pub modify: Schema,
    pub delete: Schema,
    /// 删除需求使用导入模板的列（仅作用于 delete，不推广到其他类型）
    pub delete_uses_import: bool,
}

impl TemplateSet {
    /// 某需求类型自身存储的模板
    pub fn schema(&self, record_type: RecordType) -> &Schema {
        match record_type {
            RecordType::Import => &self.import,
            RecordType::Modify => &self.modify,
            RecordType::Delete => &self.delete,
        }
    }

    pub fn schema_mut(&mut self, record_type: RecordType) -> &mut Schema {
        match record_type {
            RecordType::Import => &mut self.import,
            RecordType::Modify => &mut self.modify,
            RecordType::Delete => &mut self.delete,
        }
    }

    /// 实际生效的模板
    ///
    /// effective(delete) = import（当 delete_uses_import 开启时），其余类型取自身模板
    pub fn effective_schema(&self, record_type: RecordType) -> &Schema {
        match record_type {
            RecordType::Delete if self.delete_uses_import => &self.import,
            other => self.schema(other),
        }
    }

    /// 内置默认模板（初始化数据库时写入）
    pub fn defaults() -> Self {
        Self {
            import: default_schema(&[
                "名称", "设备类型", "厂商", "版本", "IP", "其他IP", "安装位置", "分组", "认证方式",
            ]),
            modify: default_schema(&[
                "名称", "设备类型", "厂商", "版本", "IP", "其他IP", "安装位置", "现有分组",
                "新分组", "认证方式",
            ]),
            delete: default_schema(&["名称", "操作类型", "IP", "备注信息"]),
            delete_uses_import: true,
        }
    }
}

/// 名称和 IP 必填，其余列可选
fn default_schema(names: &[&str]) -> Schema {
    Schema {
        columns: names
            .iter()
            .map(|name| match *name {
                "名称" => ColumnDefinition::new(*name, true, "Router-01"),
                "IP" => ColumnDefinition::new(*name, true, "10.0.0.1"),
                _ => ColumnDefinition::optional(*name),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new(vec![
            ColumnDefinition::new("名称", true, "R1"),
            ColumnDefinition::new("IP", true, "10.0.0.1"),
            ColumnDefinition::optional("备注"),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let result = Schema::new(vec![
            ColumnDefinition::optional("名称"),
            ColumnDefinition::optional(" 名称 "),
        ]);
        assert_eq!(result, Err(TemplateError::DuplicateColumn("名称".to_string())));
    }

    #[test]
    fn test_new_rejects_blank_name() {
        let result = Schema::new(vec![ColumnDefinition::optional("  ")]);
        assert_eq!(result, Err(TemplateError::EmptyColumnName));
    }

    #[test]
    fn test_edit_column_allows_same_name_at_same_index() {
        let mut schema = sample();
        schema
            .edit_column(0, ColumnDefinition::new("名称", false, "R2"))
            .unwrap();
        assert!(!schema.get("名称").unwrap().required);

        let err = schema
            .edit_column(0, ColumnDefinition::optional("IP"))
            .unwrap_err();
        assert_eq!(err, TemplateError::DuplicateColumn("IP".to_string()));
    }

    #[test]
    fn test_move_column_at_boundaries_is_noop() {
        let mut schema = sample();
        schema.move_column(0, MoveDirection::Up).unwrap();
        schema.move_column(2, MoveDirection::Down).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["名称", "IP", "备注"]);

        schema.move_column(2, MoveDirection::Up).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["名称", "备注", "IP"]);

        assert!(schema.move_column(9, MoveDirection::Up).is_err());
    }

    #[test]
    fn test_remove_column() {
        let mut schema = sample();
        let removed = schema.remove_column(1).unwrap();
        assert_eq!(removed.name, "IP");
        assert_eq!(schema.len(), 2);
        assert!(schema.remove_column(5).is_err());
    }

    #[test]
    fn test_from_stored_object_format() {
        let raw = r#"[{"name":"名称","required":true,"example":"R1"},{"name":"IP"}]"#;
        let schema = Schema::from_stored(raw).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.get("名称").unwrap().required);
        assert_eq!(schema.get("IP").unwrap().example, "");
    }

    #[test]
    fn test_from_stored_legacy_string_array() {
        let schema = Schema::from_stored(r#"["名称","IP"]"#).unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["名称", "IP"]);
        assert!(schema.columns().iter().all(|c| !c.required && c.example.is_empty()));
    }

    #[test]
    fn test_from_stored_comma_separated() {
        let schema = Schema::from_stored("名称, IP ,,备注").unwrap();
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["名称", "IP", "备注"]);
    }

    #[test]
    fn test_stored_round_trip_preserves_order() {
        let schema = sample();
        let restored = Schema::from_stored(&schema.to_stored()).unwrap();
        assert_eq!(restored, schema);
    }

    #[test]
    fn test_effective_schema_aliases_delete_only() {
        let set = TemplateSet {
            import: sample(),
            modify: Schema::from_names(["名称", "新分组"]).unwrap(),
            delete: Schema::from_names(["名称", "操作类型"]).unwrap(),
            delete_uses_import: true,
        };
        assert_eq!(set.effective_schema(RecordType::Delete), &set.import);
        assert_eq!(set.effective_schema(RecordType::Modify), &set.modify);

        let unaliased = TemplateSet {
            delete_uses_import: false,
            ..set
        };
        assert_eq!(
            unaliased.effective_schema(RecordType::Delete),
            &unaliased.delete
        );
    }
}
