// ==========================================
// UCM需求登记系统 - 可选值与厂商版本目录仓储
// ==========================================
// 职责: 管理 column_options / manufacturer_version_info 表
// 红线: Repository 不含业务逻辑；唯一性由表约束保证
// ==========================================

use crate::domain::catalog::{HierarchyCatalog, HierarchyEntry, OptionSet};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::traits::CatalogSource;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 创建新的 CatalogRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 列可选值 =====

    pub fn list_options(&self) -> RepositoryResult<OptionSet> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT column_name, option_value FROM column_options ORDER BY column_name, option_value",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut options = OptionSet::new();
        for row in rows {
            let (column, value) = row?;
            options.insert(column, value);
        }
        Ok(options)
    }

    /// 新增可选值
    ///
    /// # 返回
    /// - Ok(true): 新增成功
    /// - Ok(false): 已存在，未做变化
    pub fn add_option(&self, column: &str, value: &str) -> RepositoryResult<bool> {
        let (column, value) = (column.trim(), value.trim());
        if column.is_empty() || value.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "column_options".to_string(),
                message: "列名和可选值不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO column_options (column_name, option_value) VALUES (?1, ?2)",
            params![column, value],
        )?;
        Ok(changed > 0)
    }

    pub fn remove_option(&self, column: &str, value: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "DELETE FROM column_options WHERE column_name = ?1 AND option_value = ?2",
            params![column.trim(), value.trim()],
        )?;
        Ok(changed > 0)
    }

    // ===== 厂商版本目录 =====

    pub fn list_hierarchy(&self) -> RepositoryResult<HierarchyCatalog> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT device_type, manufacturer, version, auth_method
             FROM manufacturer_version_info ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(HierarchyEntry::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            )
            .with_auth_method(row.get::<_, String>(3)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(HierarchyCatalog::from_entries(entries))
    }

    /// 新增目录条目（认证方式可为空）
    ///
    /// # 返回
    /// - Ok(false): 四个字段完全相同的条目已存在
    pub fn add_hierarchy_entry(&self, entry: &HierarchyEntry) -> RepositoryResult<bool> {
        let entry = entry.trimmed();
        if entry.device_type.is_empty() || entry.manufacturer.is_empty() || entry.version.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "manufacturer_version_info".to_string(),
                message: "设备类型、厂商、版本均不能为空".to_string(),
            });
        }

        let conn = self.get_conn()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO manufacturer_version_info
                 (device_type, manufacturer, version, auth_method)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.device_type,
                entry.manufacturer,
                entry.version,
                entry.auth_method
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn remove_hierarchy_entry(&self, entry: &HierarchyEntry) -> RepositoryResult<bool> {
        let entry = entry.trimmed();
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "DELETE FROM manufacturer_version_info
             WHERE device_type = ?1 AND manufacturer = ?2 AND version = ?3 AND auth_method = ?4",
            params![
                entry.device_type,
                entry.manufacturer,
                entry.version,
                entry.auth_method
            ],
        )?;
        Ok(changed > 0)
    }
}

#[async_trait]
impl CatalogSource for CatalogRepository {
    async fn load_options(&self) -> RepositoryResult<OptionSet> {
        self.list_options()
    }

    async fn load_hierarchy(&self) -> RepositoryResult<HierarchyCatalog> {
        self.list_hierarchy()
    }
}
