// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、上传文件生成、固定时间等功能
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;
use ucm_register::app::AppState;
use ucm_register::config::EngineSettings;
use ucm_register::domain::HierarchyEntry;

/// 创建临时测试数据库并初始化 schema 与默认数据
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("非 UTF-8 路径")?.to_string();

    ucm_register::db::open_and_init(&db_path)?;

    Ok((temp_file, db_path))
}

/// 创建基于临时数据库的应用状态
pub fn create_test_state() -> (NamedTempFile, AppState) {
    create_test_state_with(EngineSettings::default())
}

pub fn create_test_state_with(settings: EngineSettings) -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::with_settings(db_path, settings).expect("Failed to create AppState");
    (temp_file, state)
}

/// 写入可选值与厂商版本目录
pub fn seed_catalog(state: &AppState) {
    let admin = &state.admin_api;
    admin.add_option("分组", "核心").unwrap();
    admin.add_option("分组", "汇聚").unwrap();
    admin.add_option("认证方式", "TACACS").unwrap();
    for (device_type, manufacturer, version) in [
        ("路由器", "华为", "V8"),
        ("路由器", "华为", "V5"),
        ("路由器", "思科", "IOS-XE"),
        ("交换机", "华三", "V7"),
    ] {
        admin
            .add_hierarchy_entry(&HierarchyEntry::new(device_type, manufacturer, version))
            .unwrap();
    }
}

/// 生成临时 CSV 上传文件
pub fn write_csv(content: &str) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp csv");
    write!(temp_file, "{}", content).expect("Failed to write csv");
    temp_file
}

/// 本地时间
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 默认 import 模板表头
pub const IMPORT_HEADER: &str = "名称,设备类型,厂商,版本,IP,其他IP,安装位置,分组,认证方式";
