// ==========================================
// UCM需求登记系统 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 日志级别由 RUST_LOG 控制；UCM_REGISTER_LOG_FORMAT=json 时输出 JSON 行
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志输出格式环境变量
pub const LOG_FORMAT_ENV: &str = "UCM_REGISTER_LOG_FORMAT";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=ucm_register=trace
/// - UCM_REGISTER_LOG_FORMAT: `json` 输出结构化日志，其他值为文本
///
/// # 示例
/// ```no_run
/// use ucm_register::logging;
/// logging::init();
/// ```
pub fn init() {
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        fmt()
            .json()
            .with_env_filter(env_filter())
            .with_current_span(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .init();
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
