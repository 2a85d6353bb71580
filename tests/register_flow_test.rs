// ==========================================
// 登记流程集成测试
// ==========================================
// 测试目标: 上传 → 校验 → 修正 → 选日期 → 重复检查 → 提交 → 处理 → 导出
// 数据库: 临时 SQLite 文件
// ==========================================

mod test_helpers;

use std::collections::BTreeSet;
use test_helpers::{at, create_test_state, date, seed_catalog, write_csv, IMPORT_HEADER};
use ucm_register::api::ApiError;
use ucm_register::domain::{DuplicateKey, ValidationErrorKind};
use ucm_register::engine::{EngineError, EXPORT_HEADERS};
use ucm_register::repository::RequirementFilter;
use ucm_register::{RecordType, RequirementStatus};

#[tokio::test]
async fn test_upload_fix_and_submit() {
    ucm_register::logging::init_test();
    let (_temp_file, state) = create_test_state();
    seed_catalog(&state);

    // 2024-01-01 周一 09:00
    let now = at(2024, 1, 1, 9, 0);
    let session = state
        .register_api
        .open_session(RecordType::Import, "alice", now)
        .await
        .unwrap();

    let upload = write_csv(&format!(
        "{}\nR1,路由器,华为,V8,10.0.0.1,,A栋,核心,TACACS\nR2,路由器,思科,V8,10.0.0.2,,,汇聚,\nR3,,,,10.0.0.x,,,接入,\n",
        IMPORT_HEADER
    ));
    let ids = session.import_file(upload.path()).unwrap();
    assert_eq!(ids.len(), 3);

    let batch = session.batch_snapshot().unwrap();
    assert!(batch.row(ids[0]).unwrap().validation.is_valid());
    assert_eq!(
        batch.row(ids[1]).unwrap().validation.error_kind("版本"),
        Some(ValidationErrorKind::InvalidCombination)
    );
    let row3 = &batch.row(ids[2]).unwrap().validation;
    assert_eq!(row3.error_kind("IP"), Some(ValidationErrorKind::InvalidIpv4));
    assert_eq!(row3.error_kind("分组"), Some(ValidationErrorKind::NotInOptions));

    // 存在未通过的行时不能提交
    let err = session.submit(now, &BTreeSet::new()).await.unwrap_err();
    match err {
        ApiError::Engine(EngineError::ValidationIncomplete { invalid_rows }) => {
            assert_eq!(invalid_rows, vec![ids[1], ids[2]]);
        }
        other => panic!("Expected ValidationIncomplete, got {:?}", other),
    }

    // 修正第 2 行，删除第 3 行
    let result = session.edit_cell(ids[1], "版本", "IOS-XE").unwrap();
    assert!(result.is_valid());
    session.remove_row(ids[2]).unwrap();

    let err = session.submit(now, &BTreeSet::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::Engine(EngineError::ChangeDateMissing)));

    // 周四不是变更窗口
    let err = session
        .set_change_date(Some(date(2024, 1, 4)), now)
        .unwrap_err();
    assert!(matches!(err, ApiError::Engine(EngineError::IneligibleDate { .. })));

    session.set_change_date(Some(date(2024, 1, 3)), now).unwrap();
    let receipt = session.submit(now, &BTreeSet::new()).await.unwrap();
    assert_eq!(receipt.requirement_ids.len(), 2);
    assert!(session.batch_snapshot().unwrap().is_empty());

    let stored = state
        .admin_api
        .query_requirements(&RequirementFilter {
            status: Some(RequirementStatus::Pending),
            ..RequirementFilter::default()
        })
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.submitter == "alice"));
    assert!(stored.iter().all(|r| r.ucm_change_date == date(2024, 1, 3)));
}

#[tokio::test]
async fn test_duplicate_check_and_skip() {
    let (_temp_file, state) = create_test_state();
    let now = at(2024, 1, 1, 9, 0);
    let wednesday = date(2024, 1, 3);

    // 第一次登记 R1
    let first = state
        .register_api
        .open_session(RecordType::Import, "alice", now)
        .await
        .unwrap();
    let row = first.add_row().unwrap();
    first.edit_cell(row, "名称", "R1").unwrap();
    first.edit_cell(row, "IP", "10.0.0.1").unwrap();
    first.set_change_date(Some(wednesday), now).unwrap();
    first.submit(now, &BTreeSet::new()).await.unwrap();

    // 第二次上传包含 R1 与 R9
    let second = state
        .register_api
        .open_session(RecordType::Import, "bob", now)
        .await
        .unwrap();
    let upload = write_csv(&format!(
        "{}\nR1,,,,10.0.0.1,,,,\nR9,,,,10.0.0.9,,,,\n",
        IMPORT_HEADER
    ));
    second.import_file(upload.path()).unwrap();
    second.set_change_date(Some(wednesday), now).unwrap();

    let report = second.check_duplicates().await.unwrap();
    assert_eq!(
        report.pending.iter().cloned().collect::<Vec<_>>(),
        vec![DuplicateKey::new("R1", "10.0.0.1")]
    );
    assert!(report.within_batch.is_empty());

    // 不跳过: 持久化层拒绝整个提交，批次保持不变
    let err = second.submit(now, &BTreeSet::new()).await.unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert_eq!(second.batch_snapshot().unwrap().len(), 2);

    // 跳过重复后只登记 R9
    let receipt = second.submit(now, &report.pending).await.unwrap();
    assert_eq!(receipt.requirement_ids.len(), 1);
    assert_eq!(receipt.skipped_duplicates, vec![DuplicateKey::new("R1", "10.0.0.1")]);

    let pending = state
        .admin_api
        .query_requirements(&RequirementFilter {
            date_from: Some(wednesday),
            date_to: Some(wednesday),
            ..RequirementFilter::default()
        })
        .unwrap();
    assert_eq!(pending.len(), 2);
}

#[tokio::test]
async fn test_reload_picks_up_new_options() {
    let (_temp_file, state) = create_test_state();
    seed_catalog(&state);
    let now = at(2024, 1, 1, 9, 0);

    let session = state
        .register_api
        .open_session(RecordType::Modify, "alice", now)
        .await
        .unwrap();
    let row = session.add_row().unwrap();
    session.edit_cell(row, "名称", "SW1").unwrap();
    session.edit_cell(row, "IP", "10.1.1.1").unwrap();
    // 认证方式只有一个可选值，新增行自动填入
    assert_eq!(
        session.batch_snapshot().unwrap().row(row).unwrap().record.get("认证方式"),
        Some("TACACS")
    );

    state.admin_api.add_option("现有分组", "核心").unwrap();
    let result = session.edit_cell(row, "现有分组", "接入").unwrap();
    assert!(result.is_valid(), "旧上下文中该列没有可选值约束");

    let summary = session.validate_all(now).await.unwrap();
    assert_eq!(summary.invalid_rows, vec![row]);

    state.admin_api.add_option("现有分组", "接入").unwrap();
    let summary = session.reload(now).await.unwrap();
    assert!(summary.all_valid());
}

#[tokio::test]
async fn test_process_and_export() {
    let (_temp_file, state) = create_test_state();
    let now = at(2024, 1, 6, 8, 0);
    // 周六 2024-01-13，截止 01-11 17:00
    let saturday = date(2024, 1, 13);

    let session = state
        .register_api
        .open_session(RecordType::Delete, "alice", now)
        .await
        .unwrap();
    for (name, ip) in [("R1", "10.0.0.1"), ("R2", "10.0.0.2")] {
        let row = session.add_row().unwrap();
        session.edit_cell(row, "名称", name).unwrap();
        session.edit_cell(row, "IP", ip).unwrap();
        session.edit_cell(row, "安装位置", "B栋").unwrap();
    }
    session.set_change_date(Some(saturday), now).unwrap();
    let receipt = session.submit(now, &BTreeSet::new()).await.unwrap();
    let ids = receipt.requirement_ids;

    let processed_at = at(2024, 1, 13, 2, 0);
    state.admin_api.mark_processed(ids[0], "ops", processed_at).unwrap();
    let err = state
        .admin_api
        .mark_processed(ids[0], "ops", processed_at)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

    let count = state
        .admin_api
        .batch_complete(&ids, "ops", processed_at)
        .unwrap();
    assert_eq!(count, 1);

    let rows = state
        .admin_api
        .export_rows(&RequirementFilter {
            record_type: Some(RecordType::Delete),
            ..RequirementFilter::default()
        })
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], EXPORT_HEADERS.map(String::from).to_vec());

    let row = rows.iter().find(|r| r[2] == "R1").unwrap();
    assert_eq!(row[3], "10.0.0.1");
    assert_eq!(row[4], "2024-01-13");
    assert_eq!(row[8], "ops");
    assert_eq!(row[9], "2024-01-13 02:00:00");
    assert!(row[10].contains("安装位置: B栋"));
    assert!(!row[10].contains("名称"));
}

#[tokio::test]
async fn test_available_dates_follow_deadline_config() {
    let (_temp_file, state) = create_test_state();
    // 周二 18:00: 本周三已截止
    let now = at(2024, 1, 2, 18, 0);

    let dates = state.register_api.available_dates(now).await.unwrap();
    assert_eq!(dates[0].date, date(2024, 1, 6));

    // 周三提前量改为 -12（周三 12:00 截止）
    state.admin_api.update_deadline_config(-12, 31).unwrap();
    let dates = state.register_api.available_dates(now).await.unwrap();
    assert_eq!(dates[0].date, date(2024, 1, 3));
    assert_eq!(dates[0].deadline, at(2024, 1, 3, 12, 0));
}
