// ==========================================
// UCM需求登记系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 红线: 截止小时数在写入时校验范围，读取时不再做业务判断
// ==========================================

use crate::config::deadline_config_trait::DeadlineConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::deadline::{
    DeadlineConfig, DEFAULT_SATURDAY_DEADLINE_HOURS, DEFAULT_WEDNESDAY_DEADLINE_HOURS,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Ok(read_config_value(&conn, key)?)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_config_value(&conn, key, value)?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    // ===== 截止时间配置 =====

    /// 读取截止时间配置
    ///
    /// 值无法解析时记录警告并使用默认值；超出范围视为配置错误
    pub fn get_deadline_config(&self) -> RepositoryResult<DeadlineConfig> {
        let wednesday = self.get_hours(
            config_keys::WEDNESDAY_DEADLINE_HOURS,
            DEFAULT_WEDNESDAY_DEADLINE_HOURS,
        )?;
        let saturday = self.get_hours(
            config_keys::SATURDAY_DEADLINE_HOURS,
            DEFAULT_SATURDAY_DEADLINE_HOURS,
        )?;
        Ok(DeadlineConfig::new(wednesday, saturday)?)
    }

    fn get_hours(&self, key: &str, default: i32) -> RepositoryResult<i32> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.trim().parse::<i32>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = key,
                raw_value = %value,
                "截止小时数配置格式错误，使用默认值"
            );
            default
        }))
    }

    /// 更新截止时间配置（两项在同一事务中写入）
    ///
    /// # 返回
    /// - Err(InvalidDeadlineConfig): 小时数超出 [-168, 168]
    pub fn update_deadline_config(&self, config: &DeadlineConfig) -> RepositoryResult<()> {
        config.validate()?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        write_config_value(
            &tx,
            config_keys::WEDNESDAY_DEADLINE_HOURS,
            &config.wednesday_deadline_hours.to_string(),
        )?;
        write_config_value(
            &tx,
            config_keys::SATURDAY_DEADLINE_HOURS,
            &config.saturday_deadline_hours.to_string(),
        )?;
        tx.commit()?;

        tracing::info!(
            wednesday = config.wednesday_deadline_hours,
            saturday = config.saturday_deadline_hours,
            "截止时间配置已更新"
        );
        Ok(())
    }

    // ===== 模板解析规则 =====

    /// 删除需求是否使用导入模板（默认 true）
    pub fn delete_uses_import(&self) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        read_delete_uses_import(&conn)
    }

    pub fn set_delete_uses_import(&self, enabled: bool) -> RepositoryResult<()> {
        self.set_global_config_value(config_keys::DELETE_USES_IMPORT, &enabled.to_string())
    }
}

// ==========================================
// DeadlineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl DeadlineConfigReader for ConfigManager {
    async fn read_deadline_config(&self) -> RepositoryResult<DeadlineConfig> {
        self.get_deadline_config()
    }
}

// ==========================================
// 连接级辅助函数（供仓储在同一连接上复用）
// ==========================================

pub(crate) fn read_config_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

pub(crate) fn write_config_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
         ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now', 'localtime')",
        params![key, value],
    )?;
    Ok(())
}

pub(crate) fn read_delete_uses_import(conn: &Connection) -> RepositoryResult<bool> {
    match read_config_value(conn, config_keys::DELETE_USES_IMPORT)? {
        None => Ok(true),
        Some(raw) => parse_bool(&raw).ok_or_else(|| RepositoryError::FieldValueError {
            field: config_keys::DELETE_USES_IMPORT.to_string(),
            message: format!("无法解析为布尔值: {}", raw),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 截止时间（目标日 00:00 之前的小时数）
    pub const WEDNESDAY_DEADLINE_HOURS: &str = "ucm.wednesday_deadline_hours";
    pub const SATURDAY_DEADLINE_HOURS: &str = "ucm.saturday_deadline_hours";

    // 模板解析
    pub const DELETE_USES_IMPORT: &str = "template.delete_uses_import";
}
