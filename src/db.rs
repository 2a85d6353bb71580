// ==========================================
// UCM需求登记系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表与默认数据写入均幂等，可重复执行
// ==========================================

use crate::domain::deadline::{DEFAULT_SATURDAY_DEADLINE_HOURS, DEFAULT_WEDNESDAY_DEADLINE_HOURS};
use crate::domain::template::TemplateSet;
use crate::domain::types::RecordType;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS template_config (
            template_type TEXT PRIMARY KEY
                CHECK (template_type IN ('import', 'modify', 'delete')),
            column_definitions TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
        );

        CREATE TABLE IF NOT EXISTS column_options (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            column_name TEXT NOT NULL,
            option_value TEXT NOT NULL,
            UNIQUE (column_name, option_value)
        );

        CREATE TABLE IF NOT EXISTS manufacturer_version_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_type TEXT NOT NULL,
            manufacturer TEXT NOT NULL,
            version TEXT NOT NULL,
            auth_method TEXT NOT NULL DEFAULT '',
            UNIQUE (device_type, manufacturer, version, auth_method)
        );

        CREATE INDEX IF NOT EXISTS idx_manufacturer_version
            ON manufacturer_version_info (device_type, manufacturer, version);

        CREATE TABLE IF NOT EXISTS ucm_device_inventory (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            device_type TEXT NOT NULL DEFAULT '',
            manufacturer TEXT NOT NULL DEFAULT '',
            version TEXT NOT NULL DEFAULT '',
            ip TEXT NOT NULL,
            other_ips TEXT NOT NULL DEFAULT '',
            location TEXT NOT NULL DEFAULT '',
            group_name TEXT NOT NULL DEFAULT '',
            auth_method TEXT NOT NULL DEFAULT '',
            import_time TEXT NOT NULL,
            UNIQUE (name, ip)
        );

        CREATE INDEX IF NOT EXISTS idx_inventory_device_type
            ON ucm_device_inventory (device_type, manufacturer);

        CREATE TABLE IF NOT EXISTS ucm_requirement (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            commit_id TEXT NOT NULL,
            requirement_type TEXT NOT NULL
                CHECK (requirement_type IN ('import', 'modify', 'delete')),
            ucm_change_date TEXT NOT NULL,
            submitter TEXT NOT NULL,
            submit_time TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'processed')),
            processor TEXT,
            process_time TEXT,
            requirement_data TEXT NOT NULL,
            device_name TEXT NOT NULL DEFAULT '',
            ip TEXT NOT NULL DEFAULT '',
            note TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_requirement_status_date
            ON ucm_requirement (status, ucm_change_date);
        CREATE INDEX IF NOT EXISTS idx_requirement_name_ip
            ON ucm_requirement (device_name, ip);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 写入默认模板与截止时间配置（已存在则保留）
pub fn seed_defaults(conn: &Connection) -> rusqlite::Result<()> {
    let defaults = TemplateSet::defaults();
    for record_type in RecordType::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO template_config (template_type, column_definitions) VALUES (?1, ?2)",
            params![record_type.as_str(), defaults.schema(record_type).to_stored()],
        )?;
    }

    let defaults_kv = [
        (
            crate::config::config_keys::WEDNESDAY_DEADLINE_HOURS,
            DEFAULT_WEDNESDAY_DEADLINE_HOURS.to_string(),
        ),
        (
            crate::config::config_keys::SATURDAY_DEADLINE_HOURS,
            DEFAULT_SATURDAY_DEADLINE_HOURS.to_string(),
        ),
        (
            crate::config::config_keys::DELETE_USES_IMPORT,
            defaults.delete_uses_import.to_string(),
        ),
    ];
    for (key, value) in defaults_kv {
        conn.execute(
            "INSERT OR IGNORE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
    }
    Ok(())
}

/// 打开数据库并确保表结构与默认数据就绪
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    seed_defaults(&conn)?;

    if let Some(version) = read_schema_version(&conn)? {
        if version != CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                expected = CURRENT_SCHEMA_VERSION,
                actual = version,
                "数据库 schema_version 与程序不一致"
            );
        }
    }
    Ok(conn)
}
