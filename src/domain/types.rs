// ==========================================
// UCM需求登记系统 - 领域类型定义
// ==========================================
// 职责: 需求类型 / 需求状态等基础枚举
// 序列化格式: snake_case（与数据库 / 前端一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 需求类型 (Record Type)
// ==========================================
// 决定使用哪一套模板以及下游业务规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Import, // 导入
    Modify, // 修改
    Delete, // 删除
}

impl RecordType {
    pub const ALL: [RecordType; 3] = [RecordType::Import, RecordType::Modify, RecordType::Delete];

    /// 数据库 / 接口中使用的编码
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Import => "import",
            RecordType::Modify => "modify",
            RecordType::Delete => "delete",
        }
    }

    /// 中文显示名（导出、模板文件名使用）
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordType::Import => "导入",
            RecordType::Modify => "修改",
            RecordType::Delete => "删除",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "import" => Ok(RecordType::Import),
            "modify" => Ok(RecordType::Modify),
            "delete" => Ok(RecordType::Delete),
            other => Err(format!("未知的需求类型: {}", other)),
        }
    }
}

// ==========================================
// 需求状态 (Requirement Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Pending,   // 待处理
    Processed, // 已处理
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStatus::Pending => "pending",
            RequirementStatus::Processed => "processed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RequirementStatus::Pending => "待处理",
            RequirementStatus::Processed => "已处理",
        }
    }
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequirementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(RequirementStatus::Pending),
            "processed" => Ok(RequirementStatus::Processed),
            other => Err(format!("未知的需求状态: {}", other)),
        }
    }
}
