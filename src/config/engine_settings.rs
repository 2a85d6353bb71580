// ==========================================
// UCM需求登记系统 - 引擎参数
// ==========================================
// 职责: 校验 / 对账 / 日期闸门使用的固定参数
// 说明: 这些参数随会话上下文一起冻结，重新加载才生效
// ==========================================

use serde::{Deserialize, Serialize};

/// 上传数据行数上限
pub const DEFAULT_MAX_UPLOAD_ROWS: usize = 500;
/// 上传文件大小上限（10MB）
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// 可登记日期的展示范围（天）
pub const DEFAULT_ELIGIBLE_HORIZON_DAYS: u32 = 28;

/// 级联校验字段；认证方式不是级联层级，只在组合确定后做匹配检查
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyFields {
    pub device_type: String,
    pub manufacturer: String,
    pub version: String,
    pub auth_method: String,
}

impl Default for HierarchyFields {
    fn default() -> Self {
        Self {
            device_type: "设备类型".to_string(),
            manufacturer: "厂商".to_string(),
            version: "版本".to_string(),
            auth_method: "认证方式".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub max_upload_rows: usize,
    pub max_upload_bytes: u64,
    /// 需要做 IPv4 格式校验的列
    pub ip_columns: Vec<String>,
    /// 重复判定使用的名称列
    pub name_column: String,
    /// 重复判定使用的 IP 列
    pub ip_column: String,
    pub hierarchy: HierarchyFields,
    pub eligible_horizon_days: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_upload_rows: DEFAULT_MAX_UPLOAD_ROWS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ip_columns: vec!["IP".to_string()],
            name_column: "名称".to_string(),
            ip_column: "IP".to_string(),
            hierarchy: HierarchyFields::default(),
            eligible_horizon_days: DEFAULT_ELIGIBLE_HORIZON_DAYS,
        }
    }
}

impl EngineSettings {
    pub fn is_ip_column(&self, column: &str) -> bool {
        self.ip_columns.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"max_upload_rows": 100}"#).unwrap();
        assert_eq!(settings.max_upload_rows, 100);
        assert_eq!(settings.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(settings.is_ip_column("IP"));
        assert!(!settings.is_ip_column("其他IP"));
    }

    #[test]
    fn test_partial_hierarchy_fields_use_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"hierarchy": {"version": "固件版本"}}"#).unwrap();
        assert_eq!(settings.hierarchy.version, "固件版本");
        assert_eq!(settings.hierarchy.auth_method, "认证方式");
    }
}
