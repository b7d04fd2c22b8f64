// ==========================================
// 考场座位编排系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 所有仓储共享同一个 Arc<Mutex<Connection>>，进程内写入串行
// ==========================================

pub mod action_log_repo;
pub mod allocation_repo;
pub mod error;
pub mod exam_repo;
pub mod hall_repo;
pub mod roster_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use allocation_repo::{AllocationRepository, StudentSeatRow};
pub use error::{RepositoryError, RepositoryResult};
pub use exam_repo::{ExamHallInfo, ExamLevelInfo, ExamRepository};
pub use hall_repo::HallRepository;
pub use roster_repo::RosterRepository;
