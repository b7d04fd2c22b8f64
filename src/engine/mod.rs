// ==========================================
// 考场座位编排系统 - 引擎层
// ==========================================
// 职责: 实现分配规则,不拼 SQL
// 流程: DistributionPlanner (分流) → SeatingInterleaver (交错排座)
// ==========================================

pub mod distribution_planner;
pub mod error;
pub mod orchestrator;
pub mod seating_interleaver;

// 重导出核心引擎
pub use distribution_planner::DistributionPlanner;
pub use error::{AllocationError, AllocationResult};
pub use orchestrator::{
    AllocationOrchestrator, AllocationRepositories, DistributionResult, SeatingResult,
};
pub use seating_interleaver::SeatingInterleaver;
