// ==========================================
// UCM需求登记系统 - 模板配置仓储
// ==========================================
// 职责: 管理 template_config 表（每类需求一行，列定义存 JSON）
// 红线: Repository 不含业务逻辑；列名唯一性由 Schema 保证
// ==========================================

use crate::config::config_manager::read_delete_uses_import;
use crate::domain::template::{ColumnDefinition, MoveDirection, Schema, TemplateSet};
use crate::domain::types::RecordType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::traits::TemplateSource;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// TemplateRepository - 模板仓储
// ==========================================
pub struct TemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TemplateRepository {
    /// 创建新的 TemplateRepository 实例
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

    /// 读取某类需求自身存储的模板（未配置时为空模板）
    pub fn get_schema(&self, record_type: RecordType) -> RepositoryResult<Schema> {
        let conn = self.get_conn()?;
        read_schema(&conn, record_type)
    }

    /// 覆盖保存某类需求的模板
    pub fn save_schema(&self, record_type: RecordType, schema: &Schema) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_schema(&conn, record_type, schema)?;
        tracing::info!(
            record_type = %record_type,
            columns = schema.len(),
            "模板已保存"
        );
        Ok(())
    }

    /// 读取完整模板集合
    pub fn get_template_set(&self) -> RepositoryResult<TemplateSet> {
        let conn = self.get_conn()?;
        Ok(TemplateSet {
            import: read_schema(&conn, RecordType::Import)?,
            modify: read_schema(&conn, RecordType::Modify)?,
            delete: read_schema(&conn, RecordType::Delete)?,
            delete_uses_import: read_delete_uses_import(&conn)?,
        })
    }

    // ===== 模板管理（读 → 修改 → 写，在同一事务中完成） =====

    pub fn add_column(
        &self,
        record_type: RecordType,
        column: ColumnDefinition,
    ) -> RepositoryResult<Schema> {
        self.modify_schema(record_type, |schema| schema.add_column(column))
    }

    pub fn edit_column(
        &self,
        record_type: RecordType,
        index: usize,
        column: ColumnDefinition,
    ) -> RepositoryResult<Schema> {
        self.modify_schema(record_type, |schema| schema.edit_column(index, column))
    }

    pub fn remove_column(&self, record_type: RecordType, index: usize) -> RepositoryResult<Schema> {
        self.modify_schema(record_type, |schema| schema.remove_column(index).map(|_| ()))
    }

    pub fn move_column(
        &self,
        record_type: RecordType,
        index: usize,
        direction: MoveDirection,
    ) -> RepositoryResult<Schema> {
        self.modify_schema(record_type, |schema| schema.move_column(index, direction))
    }

    fn modify_schema<F>(&self, record_type: RecordType, edit: F) -> RepositoryResult<Schema>
    where
        F: FnOnce(&mut Schema) -> Result<(), crate::domain::template::TemplateError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut schema = read_schema(&tx, record_type)?;
        edit(&mut schema)?;
        write_schema(&tx, record_type, &schema)?;
        tx.commit()?;

        tracing::info!(
            record_type = %record_type,
            columns = schema.len(),
            "模板已更新"
        );
        Ok(schema)
    }
}

#[async_trait]
impl TemplateSource for TemplateRepository {
    async fn load_templates(&self) -> RepositoryResult<TemplateSet> {
        self.get_template_set()
    }
}

fn read_schema(conn: &Connection, record_type: RecordType) -> RepositoryResult<Schema> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT column_definitions FROM template_config WHERE template_type = ?1",
            params![record_type.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(Schema::from_stored(&raw)?),
        None => Ok(Schema::default()),
    }
}

fn write_schema(conn: &Connection, record_type: RecordType, schema: &Schema) -> RepositoryResult<()> {
    conn.execute(
        "INSERT INTO template_config (template_type, column_definitions) VALUES (?1, ?2)
         ON CONFLICT(template_type) DO UPDATE SET
             column_definitions = ?2,
             updated_at = datetime('now', 'localtime')",
        params![record_type.as_str(), schema.to_stored()],
    )?;
    Ok(())
}
