// ==========================================
// UCM需求登记系统 - 可选值清单 / 厂商版本目录
// ==========================================
// 职责:
// - OptionSet: 列名 → 合法取值集合
// - HierarchyCatalog: (设备类型, 厂商, 版本, 认证方式) 目录及其投影
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// OptionSet - 列可选值清单
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    options: BTreeMap<String, BTreeSet<String>>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 (列名, 可选值) 对构造
    pub fn from_pairs<I, C, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (column, value) in pairs {
            set.insert(column, value);
        }
        set
    }

    /// 添加可选值；已存在时返回 false
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) -> bool {
        self.options
            .entry(column.into())
            .or_default()
            .insert(value.into())
    }

    /// 移除可选值；列清单为空时同时移除该列
    pub fn remove(&mut self, column: &str, value: &str) -> bool {
        let Some(values) = self.options.get_mut(column) else {
            return false;
        };
        let removed = values.remove(value);
        if values.is_empty() {
            self.options.remove(column);
        }
        removed
    }

    /// 列是否配置了可选值清单
    pub fn has_options(&self, column: &str) -> bool {
        self.options.get(column).is_some_and(|v| !v.is_empty())
    }

    pub fn values(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.options.get(column)
    }

    /// 值是否在清单中；列未配置清单时返回 None
    pub fn allows(&self, column: &str, value: &str) -> Option<bool> {
        self.options
            .get(column)
            .filter(|v| !v.is_empty())
            .map(|values| values.contains(value))
    }

    /// 只有唯一可选值的列，新增行时自动填充
    pub fn single_value(&self, column: &str) -> Option<&str> {
        match self.options.get(column) {
            Some(values) if values.len() == 1 => values.iter().next().map(String::as_str),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

// ==========================================
// HierarchyEntry - 厂商版本信息
// ==========================================
// 唯一性覆盖全部四个字段；认证方式为空表示该版本不限制认证方式
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub device_type: String,
    pub manufacturer: String,
    pub version: String,
    #[serde(default)]
    pub auth_method: String,
}

impl HierarchyEntry {
    pub fn new(
        device_type: impl Into<String>,
        manufacturer: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            device_type: device_type.into(),
            manufacturer: manufacturer.into(),
            version: version.into(),
            auth_method: String::new(),
        }
    }

    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = auth_method.into();
        self
    }

    /// 各字段 trim 后的副本
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.device_type.trim(),
            self.manufacturer.trim(),
            self.version.trim(),
        )
        .with_auth_method(self.auth_method.trim())
    }
}

// ==========================================
// HierarchyCatalog - 设备类型 → 厂商 → 版本
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyCatalog {
    entries: Vec<HierarchyEntry>,
}

impl HierarchyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I: IntoIterator<Item = HierarchyEntry>>(entries: I) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// 添加目录条目；已存在时返回 false
    pub fn insert(&mut self, entry: HierarchyEntry) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn remove(&mut self, entry: &HierarchyEntry) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != entry);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[HierarchyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ===== 投影 =====

    /// 去重后的设备类型（保持目录顺序）
    pub fn device_types(&self) -> Vec<&str> {
        distinct(self.entries.iter().map(|e| e.device_type.as_str()))
    }

    /// 某设备类型下的厂商
    pub fn manufacturers(&self, device_type: &str) -> Vec<&str> {
        distinct(
            self.entries
                .iter()
                .filter(|e| e.device_type == device_type)
                .map(|e| e.manufacturer.as_str()),
        )
    }

    /// 某 (设备类型, 厂商) 下的版本
    pub fn versions(&self, device_type: &str, manufacturer: &str) -> Vec<&str> {
        distinct(
            self.entries
                .iter()
                .filter(|e| e.device_type == device_type && e.manufacturer == manufacturer)
                .map(|e| e.version.as_str()),
        )
    }

    /// 某 (设备类型, 厂商, 版本) 下可用的认证方式（不含空值）
    pub fn login_methods(&self, device_type: &str, manufacturer: &str, version: &str) -> Vec<&str> {
        distinct(
            self.entries
                .iter()
                .filter(|e| {
                    e.device_type == device_type
                        && e.manufacturer == manufacturer
                        && e.version == version
                        && !e.auth_method.is_empty()
                })
                .map(|e| e.auth_method.as_str()),
        )
    }

    pub fn has_device_type(&self, device_type: &str) -> bool {
        self.entries.iter().any(|e| e.device_type == device_type)
    }

    pub fn has_manufacturer(&self, manufacturer: &str) -> bool {
        self.entries.iter().any(|e| e.manufacturer == manufacturer)
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.entries.iter().any(|e| e.version == version)
    }

    pub fn manufacturer_valid_for(&self, device_type: &str, manufacturer: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.device_type == device_type && e.manufacturer == manufacturer)
    }

    pub fn contains(&self, device_type: &str, manufacturer: &str, version: &str) -> bool {
        self.entries.iter().any(|e| {
            e.device_type == device_type && e.manufacturer == manufacturer && e.version == version
        })
    }
}

fn distinct<'a, I: Iterator<Item = &'a str>>(iter: I) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    iter.filter(|v| seen.insert(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> HierarchyCatalog {
        HierarchyCatalog::from_entries(vec![
            HierarchyEntry::new("router", "VendorA", "v1"),
            HierarchyEntry::new("router", "VendorA", "v2"),
            HierarchyEntry::new("router", "VendorC", "v1"),
            HierarchyEntry::new("switch", "VendorB", "s1"),
            HierarchyEntry::new("router", "VendorA", "v1"),
        ])
    }

    #[test]
    fn test_catalog_deduplicates_entries() {
        assert_eq!(catalog().entries().len(), 4);
    }

    #[test]
    fn test_projections() {
        let c = catalog();
        assert_eq!(c.device_types(), vec!["router", "switch"]);
        assert_eq!(c.manufacturers("router"), vec!["VendorA", "VendorC"]);
        assert_eq!(c.versions("router", "VendorA"), vec!["v1", "v2"]);
        assert!(c.versions("switch", "VendorA").is_empty());
        assert!(c.contains("switch", "VendorB", "s1"));
        assert!(!c.contains("switch", "VendorB", "v1"));
        assert!(!c.manufacturer_valid_for("router", "VendorB"));
    }

    #[test]
    fn test_login_methods() {
        let c = HierarchyCatalog::from_entries(vec![
            HierarchyEntry::new("router", "VendorA", "v1").with_auth_method("SSH"),
            HierarchyEntry::new("router", "VendorA", "v1").with_auth_method("TACACS"),
            HierarchyEntry::new("router", "VendorA", "v1").with_auth_method("SSH"),
            HierarchyEntry::new("router", "VendorA", "v2"),
        ]);
        assert_eq!(c.entries().len(), 3);
        assert_eq!(c.login_methods("router", "VendorA", "v1"), vec!["SSH", "TACACS"]);
        assert!(c.login_methods("router", "VendorA", "v2").is_empty());
        // 同一组合不同认证方式仍算一个版本
        assert_eq!(c.versions("router", "VendorA"), vec!["v1", "v2"]);
    }

    #[test]
    fn test_remove_entry() {
        let mut c = catalog();
        assert!(c.remove(&HierarchyEntry::new("switch", "VendorB", "s1")));
        assert!(!c.has_device_type("switch"));
        assert!(!c.remove(&HierarchyEntry::new("switch", "VendorB", "s1")));
    }

    #[test]
    fn test_option_set_membership() {
        let mut options = OptionSet::from_pairs(vec![("分组", "核心"), ("分组", "汇聚")]);
        assert_eq!(options.allows("分组", "核心"), Some(true));
        assert_eq!(options.allows("分组", "接入"), Some(false));
        assert_eq!(options.allows("安装位置", "A"), None);
        assert!(!options.insert("分组", "核心"));

        assert!(options.remove("分组", "汇聚"));
        assert_eq!(options.single_value("分组"), Some("核心"));
        assert!(options.remove("分组", "核心"));
        assert!(!options.has_options("分组"));
    }
}
