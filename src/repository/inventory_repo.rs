// ==========================================
// UCM需求登记系统 - UCM设备清单仓储
// ==========================================
// 职责: 管理 ucm_device_inventory 表
// 红线: 整体替换在单个事务内完成；数据库故障时旧清单保持不变
// ==========================================

use crate::domain::inventory::{
    InventoryDevice, InventoryImportReport, InventoryRowError, StoredInventoryDevice,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    /// 创建新的 InventoryRepository 实例
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

    /// 清空清单并导入新数据
    ///
    /// # 参数
    /// - `devices`: 按文件顺序排列的设备（第一条对应文件第 2 行）
    /// - `import_time`: 导入时间
    ///
    /// # 返回
    /// - Ok(report): (名称, IP) 重复或缺失的行记入 errors，其余行导入
    /// - Err: 数据库故障，事务回滚
    pub fn replace_all(
        &self,
        devices: &[InventoryDevice],
        import_time: NaiveDateTime,
    ) -> RepositoryResult<InventoryImportReport> {
        let import_time = import_time.format(DATETIME_FORMAT).to_string();
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM ucm_device_inventory", [])?;

        let mut report = InventoryImportReport::default();
        for (idx, device) in devices.iter().enumerate() {
            let row = idx + 2;
            if device.name.is_empty() || device.ip.is_empty() {
                report.errors.push(InventoryRowError {
                    row,
                    message: "名称和IP不能为空".to_string(),
                });
                continue;
            }

            let inserted = tx.execute(
                "INSERT INTO ucm_device_inventory
                     (name, device_type, manufacturer, version, ip,
                      other_ips, location, group_name, auth_method, import_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    device.name,
                    device.device_type,
                    device.manufacturer,
                    device.version,
                    device.ip,
                    device.other_ips,
                    device.location,
                    device.group,
                    device.auth_method,
                    import_time,
                ],
            );
            match inserted.map_err(RepositoryError::from) {
                Ok(_) => report.imported += 1,
                Err(RepositoryError::UniqueConstraintViolation(_)) => {
                    report.errors.push(InventoryRowError {
                        row,
                        message: format!("设备重复: {} ({})", device.name, device.ip),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tx.commit()?;
        Ok(report)
    }

    /// 查询清单
    ///
    /// # 参数
    /// - `search`: 名称或 IP 包含该文本；None 返回全部
    pub fn list(&self, search: Option<&str>) -> RepositoryResult<Vec<StoredInventoryDevice>> {
        let pattern = format!("%{}%", search.map(str::trim).unwrap_or(""));
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, device_type, manufacturer, version, ip,
                    other_ips, location, group_name, auth_method, import_time
             FROM ucm_device_inventory
             WHERE name LIKE ?1 OR ip LIKE ?1
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![pattern], map_row)?;

        let mut devices = Vec::new();
        for row in rows {
            devices.push(row?);
        }
        Ok(devices)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM ucm_device_inventory", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<StoredInventoryDevice> {
    let raw_time: String = row.get(10)?;
    let import_time = NaiveDateTime::parse_from_str(&raw_time, DATETIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(StoredInventoryDevice {
        id: row.get(0)?,
        device: InventoryDevice {
            name: row.get(1)?,
            device_type: row.get(2)?,
            manufacturer: row.get(3)?,
            version: row.get(4)?,
            ip: row.get(5)?,
            other_ips: row.get(6)?,
            location: row.get(7)?,
            group: row.get(8)?,
            auth_method: row.get(9)?,
        },
        import_time,
    })
}
