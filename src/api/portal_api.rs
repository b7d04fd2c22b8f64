// ==========================================
// 考场座位编排系统 - 考生座位查询 API
// ==========================================
// 职责: 考生凭完整学号查询所有场次的考场与座位号
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::roster::{Department, Level, Student};
use crate::repository::{AllocationRepository, RosterRepository, StudentSeatRow};

// ==========================================
// PortalApi - 考生查询 API
// ==========================================
pub struct PortalApi {
    roster_repo: Arc<RosterRepository>,
    allocation_repo: Arc<AllocationRepository>,
}

impl PortalApi {
    pub fn new(roster_repo: Arc<RosterRepository>, allocation_repo: Arc<AllocationRepository>) -> Self {
        Self {
            roster_repo,
            allocation_repo,
        }
    }

    /// 按完整学号查询座位
    ///
    /// # 返回
    /// - Ok(StudentSeatLookup): 考生、年级、院系与座位列表（考试日期升序）
    /// - Err(InvalidInput): 学号为空
    /// - Err(NotFound): 考生不存在
    pub fn check_seat_allocation(&self, real_matric: &str) -> ApiResult<StudentSeatLookup> {
        let real_matric = real_matric.trim();
        if real_matric.is_empty() {
            return Err(ApiError::InvalidInput("学号不能为空".to_string()));
        }

        let student = self
            .roster_repo
            .find_student_by_real_matric(real_matric)?
            .ok_or_else(|| ApiError::NotFound(format!("考生(学号={})不存在", real_matric)))?;

        let level = self
            .roster_repo
            .find_level(&student.level_id)?
            .ok_or_else(|| ApiError::NotFound(format!("年级(id={})不存在", student.level_id)))?;

        let department = self
            .roster_repo
            .find_department(&level.department_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("院系(id={})不存在", level.department_id))
            })?;

        let seats = self.allocation_repo.find_seats_by_student(&student.id)?;

        Ok(StudentSeatLookup {
            student,
            level,
            department,
            seats,
        })
    }
}

/// 考生座位查询结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSeatLookup {
    pub student: Student,
    pub level: Level,
    pub department: Department,
    pub seats: Vec<StudentSeatRow>,
}
