// ==========================================
// UCM需求登记系统 - 重复检查
// ==========================================
// 职责: 检测候选批次与待处理需求之间的 (名称, IP) 重复
// 红线: 必须名称与 IP 同时相等；只做提示，不阻断
//       （最终冲突判定由持久化协作方负责）
// ==========================================

use crate::domain::requirement::{DuplicateKey, Record, StoredRequirement};
use std::collections::{BTreeSet, HashSet};

pub struct DuplicateGate {
    name_column: String,
    ip_column: String,
}

impl DuplicateGate {
    pub fn new(name_column: impl Into<String>, ip_column: impl Into<String>) -> Self {
        Self {
            name_column: name_column.into(),
            ip_column: ip_column.into(),
        }
    }

    /// 记录的重复判定键（trim 后）
    pub fn key_of(&self, record: &Record) -> DuplicateKey {
        DuplicateKey::new(
            record.trimmed(&self.name_column),
            record.trimmed(&self.ip_column),
        )
    }

    /// 候选记录与已有待处理需求的交集
    pub fn check_duplicates(
        &self,
        candidates: &[Record],
        existing: &[StoredRequirement],
    ) -> BTreeSet<DuplicateKey> {
        let existing_keys: HashSet<DuplicateKey> =
            existing.iter().map(StoredRequirement::duplicate_key).collect();

        candidates
            .iter()
            .map(|r| self.key_of(r))
            .filter(|key| existing_keys.contains(key))
            .collect()
    }

    /// 批次内重复
    ///
    /// # 返回
    /// - Vec<(行ID, 键)>: 重复记录（不包括第一次出现）
    pub fn within_batch<'r, I>(&self, rows: I) -> Vec<(u64, DuplicateKey)>
    where
        I: IntoIterator<Item = (u64, &'r Record)>,
    {
        let mut seen: HashSet<DuplicateKey> = HashSet::new();
        let mut duplicates = Vec::new();

        for (row_id, record) in rows {
            let key = self.key_of(record);
            if key.name.is_empty() && key.ip.is_empty() {
                continue;
            }
            if seen.contains(&key) {
                duplicates.push((row_id, key));
            } else {
                seen.insert(key);
            }
        }

        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{RecordType, RequirementStatus};
    use chrono::NaiveDate;

    fn gate() -> DuplicateGate {
        DuplicateGate::new("名称", "IP")
    }

    fn record(name: &str, ip: &str) -> Record {
        Record::from_pairs(vec![("名称", name), ("IP", ip)])
    }

    fn pending(name: &str, ip: &str) -> StoredRequirement {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        StoredRequirement {
            id: 1,
            requirement_type: RecordType::Import,
            ucm_change_date: date,
            submitter: "alice".to_string(),
            submit_time: date.and_hms_opt(9, 0, 0).unwrap(),
            status: RequirementStatus::Pending,
            processor: None,
            process_time: None,
            device_name: name.to_string(),
            ip: ip.to_string(),
            data: record(name, ip),
            note: None,
        }
    }

    #[test]
    fn test_pair_present_is_reported() {
        let dups = gate().check_duplicates(
            &[record("R1", "1.1.1.1"), record("R2", "2.2.2.2")],
            &[pending("R1", "1.1.1.1")],
        );
        assert_eq!(dups.len(), 1);
        assert!(dups.contains(&DuplicateKey::new("R1", "1.1.1.1")));
    }

    #[test]
    fn test_partial_match_is_not_reported() {
        let existing = [pending("R1", "1.1.1.1")];
        assert!(gate()
            .check_duplicates(&[record("R1", "9.9.9.9")], &existing)
            .is_empty());
        assert!(gate()
            .check_duplicates(&[record("R9", "1.1.1.1")], &existing)
            .is_empty());
    }

    #[test]
    fn test_absent_is_not_reported() {
        assert!(gate()
            .check_duplicates(&[record("R1", "1.1.1.1")], &[])
            .is_empty());
    }

    #[test]
    fn test_within_batch() {
        let a = record("R1", "1.1.1.1");
        let b = record("R2", "2.2.2.2");
        let c = record(" R1", "1.1.1.1 ");
        let blank = record("", "");
        let dups = gate().within_batch(vec![(1, &a), (2, &b), (3, &c), (4, &blank), (5, &blank)]);
        assert_eq!(dups, vec![(3, DuplicateKey::new("R1", "1.1.1.1"))]);
    }
}
