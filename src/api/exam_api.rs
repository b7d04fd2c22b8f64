// ==========================================
// 考场座位编排系统 - 考试场次 API
// ==========================================
// 职责: 场次创建/查询/删除，分流与座位表生成
// 红线: 每次成功的生成都写入操作日志
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::allocation::{AllocationSummary, Distribution, SeatAssignment};
use crate::domain::exam::ExamEvent;
use crate::engine::{
    AllocationOrchestrator, AllocationRepositories, DistributionResult, SeatingResult,
};
use crate::repository::{
    ActionLogRepository, AllocationRepository, ExamHallInfo, ExamLevelInfo, ExamRepository,
    HallRepository, RosterRepository,
};

// ==========================================
// ExamApi - 考试场次 API
// ==========================================
pub struct ExamApi {
    exam_repo: Arc<ExamRepository>,
    hall_repo: Arc<HallRepository>,
    roster_repo: Arc<RosterRepository>,
    allocation_repo: Arc<AllocationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config: Arc<ConfigManager>,
    orchestrator: AllocationOrchestrator,
}

impl ExamApi {
    /// 创建新的ExamApi实例
    pub fn new(
        exam_repo: Arc<ExamRepository>,
        hall_repo: Arc<HallRepository>,
        roster_repo: Arc<RosterRepository>,
        allocation_repo: Arc<AllocationRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        let orchestrator = AllocationOrchestrator::new(AllocationRepositories::new(
            exam_repo.clone(),
            roster_repo.clone(),
            allocation_repo.clone(),
        ));

        Self {
            exam_repo,
            hall_repo,
            roster_repo,
            allocation_repo,
            action_log_repo,
            config,
            orchestrator,
        }
    }

    // ==========================================
    // 场次管理
    // ==========================================

    /// 创建考试场次
    ///
    /// 考场/年级按请求中的顺序挂载，该顺序即后续分配的迭代顺序。
    pub fn create_exam(&self, request: CreateExamRequest, actor: &str) -> ApiResult<ExamEvent> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ApiError::InvalidInput("场次标题不能为空".to_string()));
        }
        if self.hall_repo.find_faculty(&request.faculty_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "学院(id={})不存在",
                request.faculty_id
            )));
        }

        ensure_unique("考场", &request.hall_ids)?;
        ensure_unique("年级", &request.level_ids)?;

        for hall_id in &request.hall_ids {
            if self.hall_repo.find_by_id(hall_id)?.is_none() {
                return Err(ApiError::NotFound(format!("考场(id={})不存在", hall_id)));
            }
        }
        for level_id in &request.level_ids {
            if self.roster_repo.find_level(level_id)?.is_none() {
                return Err(ApiError::NotFound(format!("年级(id={})不存在", level_id)));
            }
        }

        let exam = ExamEvent {
            id: uuid::Uuid::new_v4().to_string(),
            faculty_id: request.faculty_id.clone(),
            title: title.to_string(),
            exam_date: request.exam_date,
            created_at: chrono::Local::now().naive_local(),
        };

        self.exam_repo
            .insert(&exam, &request.hall_ids, &request.level_ids)?;

        self.action_log_repo.insert(&ActionLog::new(
            Some(exam.id.clone()),
            ActionType::CreateExam,
            actor,
            Some(serde_json::json!({
                "hall_ids": request.hall_ids,
                "level_ids": request.level_ids,
            })),
            Some(format!("创建场次: {}", exam.title)),
        ))?;

        tracing::info!(exam_id = %exam.id, title = %exam.title, "考试场次已创建");
        Ok(exam)
    }

    /// 查询学院的考试场次（考试日期倒序）
    pub fn list_exams(&self, faculty_id: &str) -> ApiResult<Vec<ExamListItem>> {
        if faculty_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("学院ID不能为空".to_string()));
        }

        let exams = self.exam_repo.list_by_faculty(faculty_id)?;
        let mut items = Vec::with_capacity(exams.len());
        for exam in exams {
            let halls = self.exam_repo.list_halls(&exam.id)?;
            let levels = self.exam_repo.list_levels(&exam.id)?;
            let seat_count = self.allocation_repo.count_seat_assignments(&exam.id)?;

            items.push(ExamListItem {
                total_capacity: halls.iter().map(|h| u64::from(h.hall.capacity)).sum(),
                total_students: levels.iter().map(|l| u64::from(l.student_count)).sum(),
                hall_count: halls.len(),
                level_count: levels.len(),
                seat_count,
                exam,
            });
        }

        Ok(items)
    }

    /// 查询场次详情（成员、分流记录、座位表）
    pub fn get_exam_detail(&self, exam_id: &str) -> ApiResult<ExamDetail> {
        let exam = self.require_exam(exam_id)?;

        Ok(ExamDetail {
            halls: self.exam_repo.list_halls(exam_id)?,
            levels: self.exam_repo.list_levels(exam_id)?,
            distributions: self.allocation_repo.find_distributions(exam_id)?,
            seats: self.allocation_repo.find_seat_assignments(exam_id)?,
            exam,
        })
    }

    /// 删除考试场次（座位表、分流记录一并删除）
    pub fn delete_exam(&self, exam_id: &str, actor: &str) -> ApiResult<()> {
        let exam = self.require_exam(exam_id)?;

        self.exam_repo.delete(exam_id)?;

        // 日志的 exam_id 已随删除置空，这里只保留描述
        self.action_log_repo.insert(&ActionLog::new(
            None,
            ActionType::DeleteExam,
            actor,
            Some(serde_json::json!({ "exam_id": exam.id })),
            Some(format!("删除场次: {}", exam.title)),
        ))?;

        tracing::info!(exam_id = %exam_id, "考试场次已删除");
        Ok(())
    }

    // ==========================================
    // 分配生成
    // ==========================================

    /// 生成分流记录（阶段一）
    pub fn generate_distribution(&self, exam_id: &str, actor: &str) -> ApiResult<DistributionResult> {
        let result = self.orchestrator.generate_distribution(exam_id)?;
        self.log_generation(ActionType::GenerateDistribution, actor, &result.summary)?;
        Ok(result)
    }

    /// 生成座位表（阶段二，回读已落库的分流记录）
    pub fn generate_seating(&self, exam_id: &str, actor: &str) -> ApiResult<SeatingResult> {
        let result = self.orchestrator.generate_seating(exam_id)?;
        self.log_generation(ActionType::GenerateSeating, actor, &result.summary)?;
        Ok(result)
    }

    /// 一键分配: 分流 + （按配置）座位表
    pub fn allocate(&self, exam_id: &str, actor: &str) -> ApiResult<AllocationOutcome> {
        let auto_seat = self
            .config
            .get_auto_seat_after_distribution()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let distribution = self.generate_distribution(exam_id, actor)?;
        let seating = if auto_seat {
            Some(self.generate_seating(exam_id, actor)?.summary)
        } else {
            None
        };

        Ok(AllocationOutcome {
            distribution: distribution.summary,
            seating,
        })
    }

    /// 查询场次操作日志
    pub fn list_action_logs(&self, exam_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_exam(exam_id)?)
    }

    fn log_generation(
        &self,
        action_type: ActionType,
        actor: &str,
        summary: &AllocationSummary,
    ) -> ApiResult<()> {
        let payload = serde_json::to_value(summary)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        self.action_log_repo.insert(&ActionLog::new(
            Some(summary.exam_id.clone()),
            action_type,
            actor,
            Some(payload),
            None,
        ))?;
        Ok(())
    }

    fn require_exam(&self, exam_id: &str) -> ApiResult<ExamEvent> {
        if exam_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("场次ID不能为空".to_string()));
        }

        self.exam_repo
            .find_by_id(exam_id)?
            .ok_or_else(|| ApiError::NotFound(format!("考试场次(id={})不存在", exam_id)))
    }
}

fn ensure_unique(kind: &str, ids: &[String]) -> ApiResult<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(ApiError::InvalidInput(format!("{}重复挂载: {}", kind, id)));
        }
    }
    Ok(())
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 创建场次请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExamRequest {
    pub title: String,
    pub exam_date: NaiveDate,
    pub faculty_id: String,
    pub hall_ids: Vec<String>,
    pub level_ids: Vec<String>,
}

/// 场次列表项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamListItem {
    pub exam: ExamEvent,
    pub hall_count: usize,
    pub level_count: usize,
    pub total_capacity: u64,
    pub total_students: u64,
    pub seat_count: u64,
}

/// 场次详情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamDetail {
    pub exam: ExamEvent,
    pub halls: Vec<ExamHallInfo>,
    pub levels: Vec<ExamLevelInfo>,
    pub distributions: Vec<Distribution>,
    pub seats: Vec<SeatAssignment>,
}

/// 一键分配结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub distribution: AllocationSummary,
    pub seating: Option<AllocationSummary>,
}
