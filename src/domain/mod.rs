// ==========================================
// 考场座位编排系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、分配输入输出
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod allocation;
pub mod exam;
pub mod hall;
pub mod roster;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use allocation::{
    AllocationSummary, Distribution, HallCapacity, LevelRosterSize, SeatAssignment,
};
pub use exam::ExamEvent;
pub use hall::{Hall, SeatCapacity};
pub use roster::{Department, Faculty, Level, LevelRoster, Student};
