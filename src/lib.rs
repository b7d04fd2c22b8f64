// ==========================================
// 考场座位编排系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 分流规划 (DistributionPlanner) + 交错排座 (SeatingInterleaver)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    ActionLog, ActionType, AllocationSummary, Distribution, ExamEvent, Hall, HallCapacity,
    Level, LevelRoster, LevelRosterSize, SeatAssignment, Student,
};

// 引擎
pub use engine::{AllocationError, AllocationOrchestrator, DistributionPlanner, SeatingInterleaver};

// API
pub use api::{DashboardApi, ExamApi, PortalApi, RegistryApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "考场座位编排系统";
