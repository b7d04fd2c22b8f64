// ==========================================
// 考场座位编排系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{DashboardApi, ExamApi, PortalApi, RegistryApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    action_log_repo::ActionLogRepository,
    allocation_repo::AllocationRepository,
    exam_repo::ExamRepository,
    hall_repo::HallRepository,
    roster_repo::RosterRepository,
};

/// 应用状态
///
/// 所有仓储共享同一个连接，进程内写操作由连接锁串行化
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 考试场次与分配API
    pub exam_api: Arc<ExamApi>,

    /// 考生座位查询API
    pub portal_api: Arc<PortalApi>,

    /// 学院统计API
    pub dashboard_api: Arc<DashboardApi>,

    /// 基础数据登记API
    pub registry_api: Arc<RegistryApi>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
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
    /// 1. 打开数据库并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================

        let hall_repo = Arc::new(HallRepository::new(conn.clone()));
        let roster_repo = Arc::new(RosterRepository::new(conn.clone()));
        let exam_repo = Arc::new(ExamRepository::new(conn.clone()));
        let allocation_repo = Arc::new(AllocationRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================

        let exam_api = Arc::new(ExamApi::new(
            exam_repo.clone(),
            hall_repo.clone(),
            roster_repo.clone(),
            allocation_repo.clone(),
            action_log_repo.clone(),
            config.clone(),
        ));

        let portal_api = Arc::new(PortalApi::new(roster_repo.clone(), allocation_repo));

        let dashboard_api = Arc::new(DashboardApi::new(
            hall_repo.clone(),
            roster_repo.clone(),
            exam_repo,
        ));

        let registry_api = Arc::new(RegistryApi::new(hall_repo, roster_repo, config.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            exam_api,
            portal_api,
            dashboard_api,
            registry_api,
            config,
            action_log_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 EXAM_SEATING_DB_PATH（非空时）
/// - 用户数据目录/exam-seating/exam_seating.db
/// - 兜底: ./exam_seating.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("EXAM_SEATING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./exam_seating.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("exam-seating");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("exam_seating.db");
        }
    }

    path.to_string_lossy().to_string()
}
