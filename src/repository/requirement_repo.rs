// ==========================================
// UCM需求登记系统 - 需求登记仓储
// ==========================================
// 职责: 管理 ucm_requirement 表（提交 / 查询 / 处理状态流转）
// 红线: Repository 不含业务逻辑；
//       同一变更日期下 (名称, IP) 的待处理冲突在此做最终判定
// ==========================================

use crate::domain::requirement::{CommitUnit, Record, StoredRequirement};
use crate::domain::types::{RecordType, RequirementStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::traits::RequirementStore;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_COLUMNS: &str = r#"
    SELECT id, requirement_type, ucm_change_date, submitter, submit_time,
           status, processor, process_time, device_name, ip,
           requirement_data, note
    FROM ucm_requirement
"#;

/// 需求列表查询条件（None 表示不过滤）
#[derive(Debug, Clone, Default)]
pub struct RequirementFilter {
    pub status: Option<RequirementStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub record_type: Option<RecordType>,
    pub submitter: Option<String>,
    /// 名称或 IP 包含该文本
    pub search: Option<String>,
}

pub struct RequirementRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RequirementRepository {
    /// 创建新的 RequirementRepository 实例
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

    /// 提交整个提交单元
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 新建需求ID
    /// - Err(UniqueConstraintViolation): 同一变更日期已存在相同 (名称, IP) 的待处理需求，
    ///   整个事务回滚
    pub fn submit(&self, unit: &CommitUnit) -> RepositoryResult<Vec<i64>> {
        let payloads = unit
            .records
            .iter()
            .map(|r| serde_json::to_string(&r.data))
            .collect::<Result<Vec<_>, _>>()?;
        let change_date = unit.change_date.format(DATE_FORMAT).to_string();
        let submit_time = unit.assembled_at.format(DATETIME_FORMAT).to_string();

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(unit.records.len());

        for (record, payload) in unit.records.iter().zip(payloads) {
            let conflict: Option<i64> = tx
                .query_row(
                    "SELECT id FROM ucm_requirement
                     WHERE status = 'pending' AND ucm_change_date = ?1
                       AND device_name = ?2 AND ip = ?3
                     LIMIT 1",
                    params![change_date, record.device_name, record.ip],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(existing) = conflict {
                tracing::warn!(
                    commit_id = %unit.commit_id,
                    existing_id = existing,
                    device_name = %record.device_name,
                    ip = %record.ip,
                    "提交冲突，事务回滚"
                );
                return Err(RepositoryError::UniqueConstraintViolation(format!(
                    "{} / {} 在 {} 已有待处理需求 (id={})",
                    record.device_name, record.ip, change_date, existing
                )));
            }

            tx.execute(
                r#"
                INSERT INTO ucm_requirement (
                    commit_id, requirement_type, ucm_change_date, submitter, submit_time,
                    status, requirement_data, device_name, ip
                ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7, ?8)
                "#,
                params![
                    unit.commit_id.to_string(),
                    record.requirement_type.as_str(),
                    change_date,
                    record.submitter_name,
                    submit_time,
                    payload,
                    record.device_name,
                    record.ip,
                ],
            )?;
            ids.push(tx.last_insert_rowid());
        }

        tx.commit()?;
        tracing::info!(
            commit_id = %unit.commit_id,
            count = ids.len(),
            "需求登记成功"
        );
        Ok(ids)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<StoredRequirement>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_requirement).optional()?)
    }

    /// 某变更日期的待处理需求
    pub fn list_pending_by_date(&self, date: NaiveDate) -> RepositoryResult<Vec<StoredRequirement>> {
        self.query(&RequirementFilter {
            status: Some(RequirementStatus::Pending),
            date_from: Some(date),
            date_to: Some(date),
            ..RequirementFilter::default()
        })
    }

    /// 按条件查询，按提交时间倒序
    pub fn query(&self, filter: &RequirementFilter) -> RepositoryResult<Vec<StoredRequirement>> {
        let mut sql = format!("{} WHERE 1 = 1", SELECT_COLUMNS);
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(Value::from(status.as_str().to_string()));
        }
        if let Some(from) = filter.date_from {
            sql.push_str(" AND ucm_change_date >= ?");
            values.push(Value::from(from.format(DATE_FORMAT).to_string()));
        }
        if let Some(to) = filter.date_to {
            sql.push_str(" AND ucm_change_date <= ?");
            values.push(Value::from(to.format(DATE_FORMAT).to_string()));
        }
        if let Some(record_type) = filter.record_type {
            sql.push_str(" AND requirement_type = ?");
            values.push(Value::from(record_type.as_str().to_string()));
        }
        if let Some(submitter) = filter.submitter.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(" AND submitter = ?");
            values.push(Value::from(submitter.to_string()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(" AND (instr(lower(device_name), lower(?)) > 0 OR instr(ip, ?) > 0)");
            values.push(Value::from(search.to_string()));
            values.push(Value::from(search.to_string()));
        }
        sql.push_str(" ORDER BY submit_time DESC, id DESC");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), map_requirement)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 标记单条需求为已处理
    pub fn mark_processed(
        &self,
        id: i64,
        processor: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE ucm_requirement
             SET status = 'processed', processor = ?2, process_time = ?3
             WHERE id = ?1 AND status = 'pending'",
            params![id, processor, now.format(DATETIME_FORMAT).to_string()],
        )?;
        if changed > 0 {
            return Ok(());
        }

        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM ucm_requirement WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match status {
            None => Err(RepositoryError::NotFound {
                entity: "UcmRequirement".to_string(),
                id: id.to_string(),
            }),
            Some(from) => Err(RepositoryError::InvalidStateTransition {
                from,
                to: RequirementStatus::Processed.as_str().to_string(),
            }),
        }
    }

    /// 批量完成（只处理仍为待处理的需求）
    ///
    /// # 返回
    /// - Ok(usize): 实际更新的条数
    pub fn batch_complete(
        &self,
        ids: &[i64],
        processor: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        if ids.is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "requirement_ids".to_string(),
                message: "请选择要完成的记录".to_string(),
            });
        }

        let process_time = now.format(DATETIME_FORMAT).to_string();
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for id in ids {
            count += tx.execute(
                "UPDATE ucm_requirement
                 SET status = 'processed', processor = ?2, process_time = ?3
                 WHERE id = ?1 AND status = 'pending'",
                params![id, processor, process_time],
            )?;
        }
        tx.commit()?;

        tracing::info!(requested = ids.len(), updated = count, "批量完成需求");
        Ok(count)
    }
}

#[async_trait]
impl RequirementStore for RequirementRepository {
    async fn list_pending_by_date(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<StoredRequirement>> {
        RequirementRepository::list_pending_by_date(self, date)
    }

    async fn submit_batch(&self, unit: &CommitUnit) -> RepositoryResult<Vec<i64>> {
        self.submit(unit)
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn parse_datetime(raw: &str, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn map_requirement(row: &Row<'_>) -> rusqlite::Result<StoredRequirement> {
    let requirement_type = row
        .get::<_, String>(1)?
        .parse::<RecordType>()
        .map_err(|e| conversion_error(1, e))?;
    let status = row
        .get::<_, String>(5)?
        .parse::<RequirementStatus>()
        .map_err(|e| conversion_error(5, e))?;
    let process_time = match row.get::<_, Option<String>>(7)? {
        Some(raw) => Some(parse_datetime(&raw, 7)?),
        None => None,
    };
    let data: Record =
        serde_json::from_str(&row.get::<_, String>(10)?).map_err(|e| conversion_error(10, e))?;

    Ok(StoredRequirement {
        id: row.get(0)?,
        requirement_type,
        ucm_change_date: parse_date(row, 2)?,
        submitter: row.get(3)?,
        submit_time: parse_datetime(&row.get::<_, String>(4)?, 4)?,
        status,
        processor: row.get(6)?,
        process_time,
        device_name: row.get(8)?,
        ip: row.get(9)?,
        data,
        note: row.get(11)?,
    })
}
