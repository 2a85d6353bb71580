// ==========================================
// UCM需求登记系统 - 提交组装
// ==========================================
// 职责: 把全部通过校验的批次组装成提交单元
// 检查顺序:
// 1. 批次非空
// 2. 需求类型一致
// 3. 每行重新校验，任一失败 → ValidationIncomplete
// 4. 变更日期已选择且通过日期闸门
// 5. 剔除操作员确认跳过的重复记录
// 红线: 不与持久化层通信；失败不修改批次
// ==========================================

use crate::domain::requirement::{CommitUnit, DuplicateKey, FinalizedRecord};
use crate::domain::types::RecordType;
use crate::engine::batch::Batch;
use crate::engine::context::EngineContext;
use crate::engine::date_gate::DateGate;
use crate::engine::duplicate::DuplicateGate;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use uuid::Uuid;

pub struct SubmissionAssembler<'a> {
    ctx: &'a EngineContext,
}

impl<'a> SubmissionAssembler<'a> {
    pub fn new(ctx: &'a EngineContext) -> Self {
        Self { ctx }
    }

    /// 组装提交单元
    ///
    /// # 参数
    /// - `batch`: 工作批次
    /// - `change_date`: UCM变更日期
    /// - `record_type`: 提交的需求类型，必须与批次一致
    /// - `submitter`: 提交人
    /// - `now`: 当前本地时间
    /// - `skip`: 操作员确认跳过的重复键
    pub fn assemble(
        &self,
        batch: &Batch,
        change_date: Option<NaiveDate>,
        record_type: RecordType,
        submitter: &str,
        now: NaiveDateTime,
        skip: &BTreeSet<DuplicateKey>,
    ) -> EngineResult<CommitUnit> {
        if batch.is_empty() {
            return Err(EngineError::EmptyBatch);
        }

        if batch.record_type() != record_type {
            return Err(EngineError::RecordTypeMismatch {
                batch: batch.record_type(),
                requested: record_type,
            });
        }

        let validator = self.ctx.validator();
        let invalid_rows: Vec<u64> = batch
            .records()
            .filter(|(_, record)| !validator.validate(record).is_valid())
            .map(|(id, _)| id)
            .collect();
        if !invalid_rows.is_empty() {
            return Err(EngineError::ValidationIncomplete { invalid_rows });
        }

        let change_date = change_date.ok_or(EngineError::ChangeDateMissing)?;
        if !DateGate::is_date_eligible(change_date, self.ctx.deadline(), now) {
            return Err(EngineError::IneligibleDate { date: change_date });
        }

        let settings = self.ctx.settings();
        let gate = DuplicateGate::new(&settings.name_column, &settings.ip_column);
        let mut records = Vec::with_capacity(batch.len());
        let mut skipped_duplicates = Vec::new();

        for (_, record) in batch.records() {
            let key = gate.key_of(record);
            if skip.contains(&key) {
                skipped_duplicates.push(key);
                continue;
            }

            let mut data = record.clone();
            data.fill_missing(self.ctx.schema());
            records.push(FinalizedRecord {
                requirement_type: record_type,
                ucm_change_date: change_date,
                submitter_name: submitter.to_string(),
                device_name: key.name,
                ip: key.ip,
                data,
            });
        }

        if records.is_empty() {
            return Err(EngineError::NothingToSubmit);
        }

        let unit = CommitUnit {
            commit_id: Uuid::new_v4(),
            record_type,
            change_date,
            submitter: submitter.to_string(),
            assembled_at: now,
            records,
            skipped_duplicates,
        };

        tracing::info!(
            commit_id = %unit.commit_id,
            record_type = %record_type,
            change_date = %change_date,
            records = unit.len(),
            skipped = unit.skipped_duplicates.len(),
            "提交单元组装完成"
        );
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::domain::catalog::{HierarchyCatalog, OptionSet};
    use crate::domain::deadline::DeadlineConfig;
    use crate::domain::requirement::Record;
    use crate::domain::template::{ColumnDefinition, Schema};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn ctx() -> EngineContext {
        let schema = Schema::new(vec![
            ColumnDefinition::new("名称", true, ""),
            ColumnDefinition::new("IP", true, ""),
            ColumnDefinition::optional("分组"),
        ])
        .unwrap();
        EngineContext::with_schema(
            RecordType::Import,
            schema,
            OptionSet::new(),
            HierarchyCatalog::new(),
            DeadlineConfig::new(7, 31).unwrap(),
            EngineSettings::default(),
            at(2024, 1, 1, 9),
        )
    }

    fn batch(ctx: &EngineContext, rows: &[(&str, &str)]) -> Batch {
        let mut batch = Batch::new(RecordType::Import);
        batch.replace_rows(
            ctx,
            rows.iter()
                .map(|(n, ip)| Record::from_pairs(vec![("名称", *n), ("IP", *ip)]))
                .collect(),
        );
        batch
    }

    fn wednesday() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 3)
    }

    #[test]
    fn test_assemble_success() {
        let ctx = ctx();
        let batch = batch(&ctx, &[("R1", "1.1.1.1"), ("R2", "2.2.2.2")]);
        let unit = SubmissionAssembler::new(&ctx)
            .assemble(
                &batch,
                wednesday(),
                RecordType::Import,
                "alice",
                at(2024, 1, 2, 16),
                &BTreeSet::new(),
            )
            .unwrap();
        assert_eq!(unit.len(), 2);
        assert_eq!(unit.records[0].device_name, "R1");
        assert_eq!(unit.records[1].ip, "2.2.2.2");
        assert_eq!(unit.records[0].data.get("分组"), Some(""));
        assert_eq!(unit.submitter, "alice");
    }

    #[test]
    fn test_invalid_row_blocks_submission() {
        let ctx = ctx();
        let batch = batch(&ctx, &[("R1", "1.1.1.1"), ("", "2.2.2.2")]);
        let err = SubmissionAssembler::new(&ctx)
            .assemble(
                &batch,
                wednesday(),
                RecordType::Import,
                "alice",
                at(2024, 1, 2, 16),
                &BTreeSet::new(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::ValidationIncomplete {
                invalid_rows: vec![2]
            }
        );
    }

    #[test]
    fn test_date_gate_is_enforced() {
        let ctx = ctx();
        let batch = batch(&ctx, &[("R1", "1.1.1.1")]);
        let assembler = SubmissionAssembler::new(&ctx);
        let err = assembler
            .assemble(
                &batch,
                wednesday(),
                RecordType::Import,
                "alice",
                at(2024, 1, 2, 18),
                &BTreeSet::new(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::IneligibleDate { .. }));

        let err = assembler
            .assemble(
                &batch,
                None,
                RecordType::Import,
                "alice",
                at(2024, 1, 2, 16),
                &BTreeSet::new(),
            )
            .unwrap_err();
        assert_eq!(err, EngineError::ChangeDateMissing);
    }

    #[test]
    fn test_empty_batch_and_type_mismatch() {
        let ctx = ctx();
        let assembler = SubmissionAssembler::new(&ctx);
        let now = at(2024, 1, 2, 16);
        assert_eq!(
            assembler
                .assemble(
                    &Batch::new(RecordType::Import),
                    wednesday(),
                    RecordType::Import,
                    "alice",
                    now,
                    &BTreeSet::new()
                )
                .unwrap_err(),
            EngineError::EmptyBatch
        );

        let batch = batch(&ctx, &[("R1", "1.1.1.1")]);
        assert!(matches!(
            assembler.assemble(
                &batch,
                wednesday(),
                RecordType::Modify,
                "alice",
                now,
                &BTreeSet::new()
            ),
            Err(EngineError::RecordTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_skipped_duplicates() {
        let ctx = ctx();
        let batch = batch(&ctx, &[("R1", "1.1.1.1"), ("R2", "2.2.2.2")]);
        let assembler = SubmissionAssembler::new(&ctx);
        let now = at(2024, 1, 2, 16);

        let skip = BTreeSet::from([DuplicateKey::new("R1", "1.1.1.1")]);
        let unit = assembler
            .assemble(&batch, wednesday(), RecordType::Import, "alice", now, &skip)
            .unwrap();
        assert_eq!(unit.len(), 1);
        assert_eq!(unit.skipped_duplicates, vec![DuplicateKey::new("R1", "1.1.1.1")]);

        let skip = BTreeSet::from([
            DuplicateKey::new("R1", "1.1.1.1"),
            DuplicateKey::new("R2", "2.2.2.2"),
        ]);
        assert_eq!(
            assembler
                .assemble(&batch, wednesday(), RecordType::Import, "alice", now, &skip)
                .unwrap_err(),
            EngineError::NothingToSubmit
        );
    }
}
