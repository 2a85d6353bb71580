// ==========================================
// UCM需求登记系统 - UCM设备清单
// ==========================================
// 职责: 设备清单条目及其上传列映射
// 说明: 清单整体替换导入，(名称, IP) 唯一
// ==========================================

use crate::domain::requirement::Record;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 清单上传文件的列名
pub mod inventory_columns {
    pub const NAME: &str = "名称";
    pub const DEVICE_TYPE: &str = "设备类型";
    pub const MANUFACTURER: &str = "厂商";
    pub const VERSION: &str = "版本";
    pub const IP: &str = "IP";
    pub const OTHER_IPS: &str = "其他IP";
    pub const LOCATION: &str = "安装位置";
    pub const GROUP: &str = "分组";
    pub const AUTH_METHOD: &str = "认证方式";

    /// 上传文件必须包含的列
    pub const REQUIRED: [&str; 2] = [NAME, IP];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDevice {
    pub name: String,
    pub device_type: String,
    pub manufacturer: String,
    pub version: String,
    pub ip: String,
    pub other_ips: String,
    pub location: String,
    pub group: String,
    pub auth_method: String,
}

impl InventoryDevice {
    /// 按列名取值；上传中没有的列记为空
    pub fn from_record(record: &Record) -> Self {
        use inventory_columns::*;
        let value = |column: &str| record.trimmed(column).to_string();
        Self {
            name: value(NAME),
            device_type: value(DEVICE_TYPE),
            manufacturer: value(MANUFACTURER),
            version: value(VERSION),
            ip: value(IP),
            other_ips: value(OTHER_IPS),
            location: value(LOCATION),
            group: value(GROUP),
            auth_method: value(AUTH_METHOD),
        }
    }
}

/// 已入库的清单条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredInventoryDevice {
    pub id: i64,
    pub device: InventoryDevice,
    pub import_time: NaiveDateTime,
}

/// 未能导入的行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRowError {
    /// 行号（表头为第 1 行，不计空白行）
    pub row: usize,
    pub message: String,
}

/// 清单导入结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryImportReport {
    pub imported: usize,
    pub errors: Vec<InventoryRowError>,
}
