// ==========================================
// UCM需求登记系统 - 记录校验器
// ==========================================
// 职责: 按模板 + 可选值清单 + 厂商版本目录校验单条记录
// 规则顺序:
// 1. 必填: required 且 trim 后为空
// 2. 格式: IP 列非空时必须为四段 1~3 位数字
// 3. 可选值: 配置了清单的列，非空值必须在清单内
// 4. 级联: 设备类型 → 厂商 → 版本（逐级检查，首个问题即停止）
// 5. 认证方式: 组合存在且目录为该版本登记了认证方式时，必须属于其中之一
// 红线: 纯函数，无 I/O；每列最多一条错误
// ==========================================

use crate::config::EngineSettings;
use crate::domain::catalog::{HierarchyCatalog, OptionSet};
use crate::domain::requirement::{Record, ValidationErrorKind, ValidationResult};
use crate::domain::template::Schema;

pub struct RecordValidator<'a> {
    schema: &'a Schema,
    options: &'a OptionSet,
    hierarchy: &'a HierarchyCatalog,
    settings: &'a EngineSettings,
}

impl<'a> RecordValidator<'a> {
    pub fn new(
        schema: &'a Schema,
        options: &'a OptionSet,
        hierarchy: &'a HierarchyCatalog,
        settings: &'a EngineSettings,
    ) -> Self {
        Self {
            schema,
            options,
            hierarchy,
            settings,
        }
    }

    /// 校验单条记录
    ///
    /// 只遍历模板声明的列；记录中的额外键不参与校验
    pub fn validate(&self, record: &Record) -> ValidationResult {
        let mut result = ValidationResult::new();

        for column in self.schema.columns() {
            let value = record.trimmed(&column.name);

            if value.is_empty() {
                if column.required {
                    result.add_error(&column.name, ValidationErrorKind::Required);
                }
                continue;
            }

            if self.settings.is_ip_column(&column.name) && !is_ipv4_format(value) {
                result.add_error(&column.name, ValidationErrorKind::InvalidIpv4);
                continue;
            }

            if self.options.allows(&column.name, value) == Some(false) {
                result.add_error(&column.name, ValidationErrorKind::NotInOptions);
            }
        }

        self.validate_hierarchy(record, &mut result);
        result
    }

    /// 级联校验
    ///
    /// 错误优先落在最具体的下级字段上；上级值本身不在目录中时，上级优先报错并停止
    fn validate_hierarchy(&self, record: &Record, result: &mut ValidationResult) {
        let fields = &self.settings.hierarchy;
        let declared = self.schema.contains(&fields.device_type)
            && self.schema.contains(&fields.manufacturer)
            && self.schema.contains(&fields.version);
        // 未配置目录时不做级联约束
        if !declared || self.hierarchy.is_empty() {
            return;
        }

        let device_type = record.trimmed(&fields.device_type);
        let manufacturer = record.trimmed(&fields.manufacturer);
        let version = record.trimmed(&fields.version);
        let catalog = self.hierarchy;

        if !device_type.is_empty() {
            if !catalog.has_device_type(device_type) {
                result.add_error(&fields.device_type, ValidationErrorKind::UnrecognizedValue);
                return;
            }
            if manufacturer.is_empty() {
                result.add_error(&fields.manufacturer, ValidationErrorKind::SelectionRequired);
                return;
            }
            if !catalog.manufacturer_valid_for(device_type, manufacturer) {
                let kind = if catalog.has_manufacturer(manufacturer) {
                    ValidationErrorKind::NotValidForParent
                } else {
                    ValidationErrorKind::UnrecognizedValue
                };
                result.add_error(&fields.manufacturer, kind);
                return;
            }
            if version.is_empty() {
                result.add_error(&fields.version, ValidationErrorKind::SelectionRequired);
                return;
            }
            if !catalog.contains(device_type, manufacturer, version) {
                result.add_error(&fields.version, ValidationErrorKind::InvalidCombination);
                return;
            }
            self.validate_auth_method(record, device_type, manufacturer, version, result);
            return;
        }

        // 设备类型为空: 只检查各自投影，以及厂商 → 版本的逐级选择
        if !manufacturer.is_empty() {
            if !catalog.has_manufacturer(manufacturer) {
                result.add_error(&fields.manufacturer, ValidationErrorKind::UnrecognizedValue);
                return;
            }
            if version.is_empty() {
                result.add_error(&fields.version, ValidationErrorKind::SelectionRequired);
                return;
            }
        }
        if !version.is_empty() && !catalog.has_version(version) {
            result.add_error(&fields.version, ValidationErrorKind::UnrecognizedValue);
        }
    }

    /// 认证方式与 (设备类型, 厂商, 版本) 的匹配检查
    fn validate_auth_method(
        &self,
        record: &Record,
        device_type: &str,
        manufacturer: &str,
        version: &str,
        result: &mut ValidationResult,
    ) {
        let column = &self.settings.hierarchy.auth_method;
        if !self.schema.contains(column) {
            return;
        }
        let auth_method = record.trimmed(column);
        if auth_method.is_empty() {
            return;
        }
        let methods = self.hierarchy.login_methods(device_type, manufacturer, version);
        if !methods.is_empty() && !methods.contains(&auth_method) {
            result.add_error(column, ValidationErrorKind::AuthMethodMismatch);
        }
    }
}

/// IPv4 格式: 四段点分，每段 1~3 位数字（不校验 0~255 语义范围）
pub fn is_ipv4_format(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| (1..=3).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::HierarchyEntry;
    use crate::domain::template::ColumnDefinition;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnDefinition::new("名称", true, "R1"),
            ColumnDefinition::new("设备类型", false, "router"),
            ColumnDefinition::new("厂商", false, "VendorA"),
            ColumnDefinition::new("版本", false, "v1"),
            ColumnDefinition::new("IP", false, "10.0.0.1"),
            ColumnDefinition::new("分组", false, ""),
        ])
        .unwrap()
    }

    fn catalog() -> HierarchyCatalog {
        HierarchyCatalog::from_entries(vec![HierarchyEntry::new("router", "VendorA", "v1")])
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut record = Record::for_schema(&schema());
        for (k, v) in pairs {
            record.set(*k, *v);
        }
        record
    }

    fn validate(record: &Record) -> ValidationResult {
        let schema = schema();
        let options = OptionSet::from_pairs(vec![("分组", "核心"), ("分组", "汇聚")]);
        let hierarchy = catalog();
        let settings = EngineSettings::default();
        RecordValidator::new(&schema, &options, &hierarchy, &settings).validate(record)
    }

    #[test]
    fn test_ipv4_format() {
        assert!(is_ipv4_format("1.2.3.4"));
        assert!(is_ipv4_format("999.10.0.001"));
        assert!(!is_ipv4_format("1.2.3"));
        assert!(!is_ipv4_format("1.2.3.4.5"));
        assert!(!is_ipv4_format("a.b.c.d"));
        assert!(!is_ipv4_format("1..3.4"));
        assert!(!is_ipv4_format("1234.1.1.1"));
    }

    #[test]
    fn test_required_empty_is_invalid() {
        let result = validate(&record(&[("名称", "   ")]));
        assert!(!result.is_valid());
        assert_eq!(result.error_kind("名称"), Some(ValidationErrorKind::Required));
    }

    #[test]
    fn test_valid_record() {
        let result = validate(&record(&[
            ("名称", "R1"),
            ("设备类型", "router"),
            ("厂商", "VendorA"),
            ("版本", "v1"),
            ("IP", "1.2.3.4"),
            ("分组", "核心"),
        ]));
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_ip_format_error() {
        for bad in ["1.2.3", "1.2.3.4.5", "a.b.c.d"] {
            let result = validate(&record(&[("名称", "R1"), ("IP", bad)]));
            assert_eq!(result.error_kind("IP"), Some(ValidationErrorKind::InvalidIpv4));
        }
    }

    #[test]
    fn test_option_membership() {
        let result = validate(&record(&[("名称", "R1"), ("分组", "接入")]));
        assert_eq!(result.error_kind("分组"), Some(ValidationErrorKind::NotInOptions));

        let result = validate(&record(&[("名称", "R1"), ("分组", " 汇聚 ")]));
        assert!(result.is_valid());
    }

    #[test]
    fn test_cascade_manufacturer_missing_flags_manufacturer_only() {
        let result = validate(&record(&[("名称", "R1"), ("设备类型", "router")]));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.error_kind("厂商"),
            Some(ValidationErrorKind::SelectionRequired)
        );
    }

    #[test]
    fn test_cascade_manufacturer_not_in_projection() {
        let result = validate(&record(&[
            ("名称", "R1"),
            ("设备类型", "router"),
            ("厂商", "VendorB"),
        ]));
        // 厂商不在 router 的投影中，只报这一条，版本缺失不再报
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.error_kind("厂商"),
            Some(ValidationErrorKind::UnrecognizedValue)
        );
        assert!(result.error_for("版本").is_none());
        assert!(result.error_for("设备类型").is_none());
    }

    #[test]
    fn test_cascade_unknown_device_type_short_circuits() {
        let result = validate(&record(&[("名称", "R1"), ("设备类型", "firewall")]));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.error_kind("设备类型"),
            Some(ValidationErrorKind::UnrecognizedValue)
        );
    }

    #[test]
    fn test_cascade_version_missing() {
        let result = validate(&record(&[
            ("名称", "R1"),
            ("设备类型", "router"),
            ("厂商", "VendorA"),
        ]));
        assert_eq!(
            result.error_kind("版本"),
            Some(ValidationErrorKind::SelectionRequired)
        );
    }

    #[test]
    fn test_cascade_invalid_combination() {
        let result = validate(&record(&[
            ("名称", "R1"),
            ("设备类型", "router"),
            ("厂商", "VendorA"),
            ("版本", "v9"),
        ]));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.error_kind("版本"),
            Some(ValidationErrorKind::InvalidCombination)
        );
    }

    #[test]
    fn test_auth_method_must_belong_to_version() {
        let schema = Schema::new(vec![
            ColumnDefinition::new("名称", true, "R1"),
            ColumnDefinition::optional("设备类型"),
            ColumnDefinition::optional("厂商"),
            ColumnDefinition::optional("版本"),
            ColumnDefinition::optional("认证方式"),
        ])
        .unwrap();
        let options = OptionSet::from_pairs(vec![("认证方式", "SSH"), ("认证方式", "TACACS")]);
        let hierarchy = HierarchyCatalog::from_entries(vec![
            HierarchyEntry::new("router", "VendorA", "v1").with_auth_method("SSH"),
            HierarchyEntry::new("router", "VendorA", "v2"),
        ]);
        let settings = EngineSettings::default();
        let validator = RecordValidator::new(&schema, &options, &hierarchy, &settings);
        let check = |version: &str, auth: &str| {
            validator.validate(&Record::from_pairs(vec![
                ("名称", "R1"),
                ("设备类型", "router"),
                ("厂商", "VendorA"),
                ("版本", version),
                ("认证方式", auth),
            ]))
        };

        assert!(check("v1", "SSH").is_valid());
        assert!(check("v1", "").is_valid());
        let result = check("v1", "TACACS");
        assert_eq!(result.errors().len(), 1);
        assert_eq!(
            result.error_kind("认证方式"),
            Some(ValidationErrorKind::AuthMethodMismatch)
        );
        assert!(result.warnings().is_empty());

        // 未登记认证方式的版本不做限制
        assert!(check("v2", "TACACS").is_valid());
        // 可选值错误优先
        assert_eq!(
            check("v1", "Telnet").error_kind("认证方式"),
            Some(ValidationErrorKind::NotInOptions)
        );
        // 组合不存在时只报版本
        let result = check("v9", "TACACS");
        assert!(result.error_for("认证方式").is_none());
    }

    #[test]
    fn test_cascade_without_device_type() {
        let result = validate(&record(&[("名称", "R1"), ("厂商", "VendorA")]));
        assert_eq!(
            result.error_kind("版本"),
            Some(ValidationErrorKind::SelectionRequired)
        );

        let result = validate(&record(&[("名称", "R1"), ("版本", "v7")]));
        assert_eq!(
            result.error_kind("版本"),
            Some(ValidationErrorKind::UnrecognizedValue)
        );
    }

    #[test]
    fn test_cascade_skipped_when_catalog_empty() {
        let schema = schema();
        let options = OptionSet::new();
        let hierarchy = HierarchyCatalog::new();
        let settings = EngineSettings::default();
        let validator = RecordValidator::new(&schema, &options, &hierarchy, &settings);
        let result = validator.validate(&record(&[("名称", "R1"), ("设备类型", "anything")]));
        assert!(result.is_valid());
    }

    #[test]
    fn test_is_valid_matches_errors() {
        let samples = vec![
            record(&[]),
            record(&[("名称", "R1")]),
            record(&[("名称", "R1"), ("IP", "x")]),
            record(&[("名称", "R1"), ("设备类型", "router"), ("厂商", "VendorA"), ("版本", "v1")]),
        ];
        for r in samples {
            let result = validate(&r);
            assert_eq!(result.is_valid(), result.errors().is_empty());
        }
    }

    #[test]
    fn test_undeclared_keys_are_ignored() {
        let mut r = record(&[("名称", "R1")]);
        r.set("额外列", "1.2.3");
        assert!(validate(&r).is_valid());
    }
}
