// ==========================================
// 考场座位编排系统 - 分配编排器
// ==========================================
// 用途: 串联 加载 → 校验 → 计算 → 整体替换写入
// 顺序: 分流规划落库完成后，座位编排再回读分流记录
// 红线: 任何校验失败都发生在删除旧结果之前，旧结果保持不变
// ==========================================

use crate::domain::allocation::{
    AllocationSummary, Distribution, HallCapacity, LevelRosterSize, SeatAssignment,
};
use crate::domain::roster::LevelRoster;
use crate::engine::distribution_planner::DistributionPlanner;
use crate::engine::error::{AllocationError, AllocationResult};
use crate::engine::seating_interleaver::SeatingInterleaver;
use crate::repository::{AllocationRepository, ExamRepository, RosterRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// AllocationRepositories - 分配引擎仓储集合
// ==========================================
#[derive(Clone)]
pub struct AllocationRepositories {
    /// 场次仓储（考场/年级成员与顺序）
    pub exam_repo: Arc<ExamRepository>,
    /// 名册仓储
    pub roster_repo: Arc<RosterRepository>,
    /// 分配结果仓储
    pub allocation_repo: Arc<AllocationRepository>,
}

impl AllocationRepositories {
    pub fn new(
        exam_repo: Arc<ExamRepository>,
        roster_repo: Arc<RosterRepository>,
        allocation_repo: Arc<AllocationRepository>,
    ) -> Self {
        Self {
            exam_repo,
            roster_repo,
            allocation_repo,
        }
    }
}

/// 阶段一结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionResult {
    pub distributions: Vec<Distribution>,
    pub summary: AllocationSummary,
}

/// 阶段二结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatingResult {
    pub seats: Vec<SeatAssignment>,
    pub summary: AllocationSummary,
}

// ==========================================
// AllocationOrchestrator - 分配编排器
// ==========================================
pub struct AllocationOrchestrator {
    repos: AllocationRepositories,
    planner: DistributionPlanner,
    interleaver: SeatingInterleaver,
}

impl AllocationOrchestrator {
    pub fn new(repos: AllocationRepositories) -> Self {
        Self {
            repos,
            planner: DistributionPlanner::new(),
            interleaver: SeatingInterleaver::new(),
        }
    }

    /// 生成场次分流记录（整体替换）
    ///
    /// # 返回
    /// - Ok(DistributionResult): 已落库的分流记录
    /// - Err(ExamNotFound / InsufficientCapacity): 未做任何写入
    pub fn generate_distribution(&self, exam_id: &str) -> AllocationResult<DistributionResult> {
        self.ensure_exam_exists(exam_id)?;

        let halls = self.repos.exam_repo.list_halls(exam_id)?;
        let levels = self.repos.exam_repo.list_levels(exam_id)?;

        let hall_capacities: Vec<HallCapacity> = halls
            .iter()
            .map(|h| HallCapacity::new(h.hall.id.clone(), h.hall.capacity))
            .collect();
        let level_sizes: Vec<LevelRosterSize> = levels
            .iter()
            .map(|l| LevelRosterSize::new(l.level.id.clone(), l.student_count))
            .collect();

        info!(
            exam_id = %exam_id,
            hall_count = hall_capacities.len(),
            level_count = level_sizes.len(),
            "开始生成分流记录"
        );

        let distributions = match self.planner.plan(exam_id, &hall_capacities, &level_sizes) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(exam_id = %exam_id, error = %e, "分流规划校验失败，保留原有记录");
                return Err(e);
            }
        };

        self.repos
            .allocation_repo
            .replace_distributions(exam_id, &distributions)?;

        let summary = AllocationSummary {
            exam_id: exam_id.to_string(),
            hall_count: hall_capacities.len(),
            level_count: level_sizes.len(),
            total_capacity: hall_capacities.iter().map(|h| u64::from(h.capacity)).sum(),
            total_students: level_sizes.iter().map(|l| u64::from(l.student_count)).sum(),
            distribution_count: distributions.len(),
            seat_count: 0,
        };

        info!(
            exam_id = %exam_id,
            distribution_count = summary.distribution_count,
            total_students = summary.total_students,
            "分流记录已写入"
        );

        Ok(DistributionResult {
            distributions,
            summary,
        })
    }

    /// 生成场次座位表（整体替换）
    ///
    /// 回读已落库的分流记录与年级名册，按考场轮转交错。
    ///
    /// # 返回
    /// - Ok(SeatingResult): 已落库的座位表
    /// - Err(ExamNotFound / InvalidDistribution): 未做任何写入
    pub fn generate_seating(&self, exam_id: &str) -> AllocationResult<SeatingResult> {
        self.ensure_exam_exists(exam_id)?;

        let halls = self.repos.exam_repo.list_halls(exam_id)?;
        let levels = self.repos.exam_repo.list_levels(exam_id)?;
        let distributions = self.repos.allocation_repo.find_distributions(exam_id)?;

        // 场次全部年级的名册（含分流时为空的年级），用于校验分流是否过期
        let rosters = levels
            .iter()
            .map(|l| self.repos.roster_repo.load_roster(&l.level.id))
            .collect::<Result<Vec<LevelRoster>, _>>()?;

        let hall_ids: Vec<String> = halls.iter().map(|h| h.hall.id.clone()).collect();

        info!(
            exam_id = %exam_id,
            hall_count = hall_ids.len(),
            distribution_count = distributions.len(),
            "开始生成座位表"
        );

        let seats = match self
            .interleaver
            .interleave(exam_id, &hall_ids, &distributions, &rosters)
        {
            Ok(seats) => seats,
            Err(e) => {
                warn!(exam_id = %exam_id, error = %e, "座位编排校验失败，保留原有座位表");
                return Err(e);
            }
        };

        self.repos
            .allocation_repo
            .replace_seat_assignments(exam_id, &seats)?;

        let summary = AllocationSummary {
            exam_id: exam_id.to_string(),
            hall_count: halls.len(),
            level_count: rosters.len(),
            total_capacity: halls.iter().map(|h| u64::from(h.hall.capacity)).sum(),
            total_students: seats.len() as u64,
            distribution_count: distributions.len(),
            seat_count: seats.len(),
        };

        info!(
            exam_id = %exam_id,
            seat_count = summary.seat_count,
            "座位表已写入"
        );

        Ok(SeatingResult { seats, summary })
    }

    fn ensure_exam_exists(&self, exam_id: &str) -> AllocationResult<()> {
        match self.repos.exam_repo.find_by_id(exam_id)? {
            Some(_) => Ok(()),
            None => Err(AllocationError::ExamNotFound(exam_id.to_string())),
        }
    }
}
