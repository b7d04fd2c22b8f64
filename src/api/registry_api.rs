// ==========================================
// 考场座位编排系统 - 基础数据登记 API
// ==========================================
// 职责: 学院、考场、院系、年级、考生的登记（分配引擎的输入来源）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::hall::Hall;
use crate::domain::roster::{Department, Faculty, Level, Student};
use crate::repository::{HallRepository, RosterRepository};

// ==========================================
// RegistryApi - 基础数据登记 API
// ==========================================
pub struct RegistryApi {
    hall_repo: Arc<HallRepository>,
    roster_repo: Arc<RosterRepository>,
    config: Arc<ConfigManager>,
}

impl RegistryApi {
    pub fn new(
        hall_repo: Arc<HallRepository>,
        roster_repo: Arc<RosterRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            hall_repo,
            roster_repo,
            config,
        }
    }

    pub fn create_faculty(&self, name: &str) -> ApiResult<Faculty> {
        let name = require_text("学院名称", name)?;
        let faculty = Faculty {
            id: new_id(),
            name,
        };
        self.hall_repo.insert_faculty(&faculty)?;
        Ok(faculty)
    }

    // ==========================================
    // 考场
    // ==========================================

    /// 登记考场
    ///
    /// # 校验
    /// - 名称、编码不能为空
    /// - 容量在 1..=max_hall_capacity 之间
    pub fn create_hall(&self, request: CreateHallRequest) -> ApiResult<Hall> {
        let name = require_text("考场名称", &request.name)?;
        let code = require_text("考场编码", &request.code)?;
        self.validate_capacity(request.capacity)?;

        let hall = Hall {
            id: new_id(),
            faculty_id: request.faculty_id,
            name,
            code,
            capacity: request.capacity,
        };
        self.hall_repo.insert(&hall)?;
        Ok(hall)
    }

    pub fn update_hall_capacity(&self, hall_id: &str, capacity: u32) -> ApiResult<()> {
        self.validate_capacity(capacity)?;
        self.hall_repo.update_capacity(hall_id, capacity)?;
        Ok(())
    }

    pub fn list_halls(&self, faculty_id: &str) -> ApiResult<Vec<Hall>> {
        Ok(self.hall_repo.list_by_faculty(faculty_id)?)
    }

    pub fn delete_hall(&self, hall_id: &str) -> ApiResult<()> {
        self.hall_repo.delete(hall_id)?;
        Ok(())
    }

    // ==========================================
    // 院系 / 年级
    // ==========================================

    pub fn create_department(&self, faculty_id: &str, name: &str) -> ApiResult<Department> {
        let department = Department {
            id: new_id(),
            faculty_id: faculty_id.to_string(),
            name: require_text("院系名称", name)?,
        };
        self.roster_repo.insert_department(&department)?;
        Ok(department)
    }

    pub fn list_departments(&self, faculty_id: &str) -> ApiResult<Vec<Department>> {
        Ok(self.roster_repo.list_departments(faculty_id)?)
    }

    /// 删除院系（其下年级、考生一并删除）
    pub fn delete_department(&self, department_id: &str) -> ApiResult<()> {
        self.roster_repo.delete_department(department_id)?;
        Ok(())
    }

    pub fn create_level(
        &self,
        department_id: &str,
        name: &str,
        matric_format: &str,
    ) -> ApiResult<Level> {
        let level = Level {
            id: new_id(),
            department_id: department_id.to_string(),
            name: require_text("年级名称", name)?,
            matric_format: matric_format.trim().to_string(),
        };
        self.roster_repo.insert_level(&level)?;
        Ok(level)
    }

    pub fn list_levels(&self, department_id: &str) -> ApiResult<Vec<Level>> {
        Ok(self.roster_repo.list_levels(department_id)?)
    }

    /// 删除年级（其下考生一并删除）
    pub fn delete_level(&self, level_id: &str) -> ApiResult<()> {
        self.roster_repo.delete_level(level_id)?;
        Ok(())
    }

    // ==========================================
    // 考生
    // ==========================================

    /// 登记单个考生（完整学号 = 年级学号前缀 + 分隔串 + 序号）
    pub fn enroll_student(&self, level_id: &str, matric_no: &str, name: &str) -> ApiResult<Student> {
        let level = self.require_level(level_id)?;
        let separator = self.matric_separator()?;
        let student = build_student(&level, &separator, matric_no, name)?;

        self.roster_repo.insert_student(&student)?;
        Ok(student)
    }

    /// 批量登记考生（同年级重复序号跳过）
    ///
    /// # 返回
    /// - Ok(usize): 实际新增人数
    pub fn enroll_students(&self, level_id: &str, entries: &[EnrollmentEntry]) -> ApiResult<usize> {
        let level = self.require_level(level_id)?;
        let separator = self.matric_separator()?;

        let students = entries
            .iter()
            .map(|e| build_student(&level, &separator, &e.matric_no, &e.name))
            .collect::<ApiResult<Vec<Student>>>()?;

        let inserted = self.roster_repo.insert_students(&students)?;
        tracing::info!(
            level_id = %level_id,
            requested = entries.len(),
            inserted,
            "考生批量登记完成"
        );
        Ok(inserted)
    }

    /// 年级名册（名册顺序）
    pub fn list_students(&self, level_id: &str) -> ApiResult<Vec<Student>> {
        Ok(self.roster_repo.list_students(level_id)?)
    }

    pub fn remove_student(&self, student_id: &str) -> ApiResult<()> {
        self.roster_repo.delete_student(student_id)?;
        Ok(())
    }

    fn require_level(&self, level_id: &str) -> ApiResult<Level> {
        self.roster_repo
            .find_level(level_id)?
            .ok_or_else(|| ApiError::NotFound(format!("年级(id={})不存在", level_id)))
    }

    fn validate_capacity(&self, capacity: u32) -> ApiResult<()> {
        let max = self
            .config
            .get_max_hall_capacity()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        if capacity == 0 || capacity > max {
            return Err(ApiError::InvalidInput(format!(
                "考场容量必须在 1..={} 之间: {}",
                max, capacity
            )));
        }
        Ok(())
    }

    fn matric_separator(&self) -> ApiResult<String> {
        self.config
            .get_matric_separator()
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn require_text(field: &str, value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(trimmed.to_string())
}

fn build_student(level: &Level, separator: &str, matric_no: &str, name: &str) -> ApiResult<Student> {
    let matric_no = require_text("考生序号", matric_no)?;
    Ok(Student {
        id: new_id(),
        level_id: level.id.clone(),
        real_matric: level.real_matric(separator, &matric_no),
        matric_no,
        name: require_text("考生姓名", name)?,
    })
}

// ==========================================
// DTO 类型定义
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHallRequest {
    pub faculty_id: String,
    pub name: String,
    pub code: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentEntry {
    pub matric_no: String,
    pub name: String,
}

impl EnrollmentEntry {
    pub fn new(matric_no: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            matric_no: matric_no.into(),
            name: name.into(),
        }
    }
}
