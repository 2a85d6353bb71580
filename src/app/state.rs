// ==========================================
// UCM需求登记系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接、仓储和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AdminApi, RegisterApi};
use crate::config::{ConfigManager, EngineSettings};
use crate::repository::{
    CatalogRepository, InventoryRepository, RequirementRepository, TemplateRepository,
};

/// 应用状态
///
/// 所有仓储共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 登记API
    pub register_api: Arc<RegisterApi>,

    /// 管理API
    pub admin_api: Arc<AdminApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表、写入默认模板与配置
    /// 2. 初始化所有Repository
    /// 3. 创建登记API与管理API
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_settings(db_path, EngineSettings::default())
    }

    pub fn with_settings(db_path: String, settings: EngineSettings) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_and_init(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let template_repo = Arc::new(TemplateRepository::from_connection(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepository::from_connection(conn.clone()));
        let inventory_repo = Arc::new(InventoryRepository::from_connection(conn.clone()));
        let requirement_repo = Arc::new(RequirementRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 创建API实例
        // ==========================================
        let register_api = Arc::new(RegisterApi::new(
            template_repo.clone(),
            catalog_repo.clone(),
            config_manager.clone(),
            requirement_repo.clone(),
            settings.clone(),
        ));
        let admin_api = Arc::new(AdminApi::new(
            template_repo,
            catalog_repo,
            inventory_repo,
            requirement_repo,
            config_manager.clone(),
            settings,
        ));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            register_api,
            admin_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 UCM_REGISTER_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("UCM_REGISTER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./ucm_register.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("ucm-register");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("ucm_register.db");
        }
    }

    path.to_string_lossy().to_string()
}
