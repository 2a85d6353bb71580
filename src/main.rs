// ==========================================
// UCM需求登记系统 - 命令行入口
// ==========================================
// 用法:
//   ucm-register init  [db_path]
//   ucm-register dates [db_path]
//   ucm-register check <file> <import|modify|delete> [db_path]
//   ucm-register inventory <file> [db_path]
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use ucm_register::app::{get_default_db_path, AppState};
use ucm_register::engine::DuplicateGate;
use ucm_register::RecordType;

const USAGE: &str = "用法:
  ucm-register init  [db_path]
  ucm-register dates [db_path]
  ucm-register check <file> <import|modify|delete> [db_path]
  ucm-register inventory <file> [db_path]";

#[tokio::main]
async fn main() -> Result<()> {
    ucm_register::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("");

    match command {
        "init" => init(db_path_arg(&args, 1)),
        "dates" => dates(db_path_arg(&args, 1)).await,
        "check" => {
            let file = args.get(1).ok_or_else(|| anyhow!("缺少上传文件路径\n{}", USAGE))?;
            let record_type: RecordType = args
                .get(2)
                .ok_or_else(|| anyhow!("缺少需求类型\n{}", USAGE))?
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            check(file, record_type, db_path_arg(&args, 3)).await
        }
        "inventory" => {
            let file = args.get(1).ok_or_else(|| anyhow!("缺少清单文件路径\n{}", USAGE))?;
            inventory(file, db_path_arg(&args, 2))
        }
        _ => bail!("{}", USAGE),
    }
}

fn db_path_arg(args: &[String], index: usize) -> String {
    args.get(index)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path)
}

fn open_state(db_path: String) -> Result<AppState> {
    tracing::info!("{} v{}", ucm_register::APP_NAME, ucm_register::VERSION);
    AppState::new(db_path).map_err(|e| anyhow!(e))
}

/// 建表并写入默认模板与截止配置
fn init(db_path: String) -> Result<()> {
    let state = open_state(db_path)?;
    let deadline = state.config_manager.get_deadline_config()?;
    println!("数据库已初始化: {}", state.db_path);
    println!(
        "截止提前小时数: 周三={} 周六={}",
        deadline.wednesday_deadline_hours, deadline.saturday_deadline_hours
    );
    Ok(())
}

/// 列出可登记的UCM变更日期
async fn dates(db_path: String) -> Result<()> {
    let state = open_state(db_path)?;
    let now = Local::now().naive_local();
    let dates = state.register_api.available_dates(now).await?;

    if dates.is_empty() {
        println!("当前没有可登记的UCM变更日期");
        return Ok(());
    }
    for date in dates {
        println!("{}  ({})", date.date, date.label);
    }
    Ok(())
}

/// 解析上传文件，对账并逐行校验
async fn check(file: &str, record_type: RecordType, db_path: String) -> Result<()> {
    let state = open_state(db_path)?;
    let now = Local::now().naive_local();
    let session = state
        .register_api
        .open_session(record_type, "cli", now)
        .await?;

    session
        .import_file(file)
        .with_context(|| format!("上传文件未通过对账: {}", file))?;

    let batch = session.batch_snapshot()?;
    let mut invalid = 0;
    for (index, row) in batch.rows().iter().enumerate() {
        if row.validation.is_valid() {
            continue;
        }
        invalid += 1;
        for (column, error) in row.validation.errors() {
            println!("第{}行 [{}] {}", index + 1, column, error.message);
        }
    }

    let settings = state.register_api.settings();
    let gate = DuplicateGate::new(&settings.name_column, &settings.ip_column);
    for (row_id, key) in gate.within_batch(batch.records()) {
        println!("批次内重复: row_id={} 名称={} IP={}", row_id, key.name, key.ip);
    }

    println!(
        "共 {} 行，校验通过 {} 行，未通过 {} 行",
        batch.len(),
        batch.len() - invalid,
        invalid
    );
    Ok(())
}

/// 整体替换UCM设备清单
fn inventory(file: &str, db_path: String) -> Result<()> {
    let state = open_state(db_path)?;
    let now = Local::now().naive_local();
    let report = state
        .admin_api
        .import_inventory_file(file, now)
        .with_context(|| format!("设备清单导入失败: {}", file))?;

    for error in &report.errors {
        println!("第{}行 {}", error.row, error.message);
    }
    println!("成功导入 {} 条记录，失败 {} 条", report.imported, report.errors.len());
    Ok(())
}
