// ==========================================
// 考场座位编排系统 - 驾驶舱 API
// ==========================================
// 职责: 学院维度的基础数据统计
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::repository::{ExamRepository, HallRepository, RosterRepository};

pub struct DashboardApi {
    hall_repo: Arc<HallRepository>,
    roster_repo: Arc<RosterRepository>,
    exam_repo: Arc<ExamRepository>,
}

impl DashboardApi {
    pub fn new(
        hall_repo: Arc<HallRepository>,
        roster_repo: Arc<RosterRepository>,
        exam_repo: Arc<ExamRepository>,
    ) -> Self {
        Self {
            hall_repo,
            roster_repo,
            exam_repo,
        }
    }

    /// 学院统计: 考场数、院系数、考生数、场次数
    pub fn get_dashboard_stats(&self, faculty_id: &str) -> ApiResult<DashboardStats> {
        if faculty_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("学院ID不能为空".to_string()));
        }

        Ok(DashboardStats {
            hall_count: self.hall_repo.count_by_faculty(faculty_id)?,
            department_count: self.roster_repo.count_departments_by_faculty(faculty_id)?,
            student_count: self.roster_repo.count_students_by_faculty(faculty_id)?,
            exam_count: self.exam_repo.count_by_faculty(faculty_id)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub hall_count: u64,
    pub department_count: u64,
    pub student_count: u64,
    pub exam_count: u64,
}
