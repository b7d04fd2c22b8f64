// ==========================================
// 考场座位编排系统 - 院系/年级/考生领域模型
// ==========================================
// 红线: 年级名册必须是确定的全序 (matric_no 升序, id 兜底)
// 说明: 分配区间 [start_index, end_index] 只在固定顺序下有意义
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Faculty - 学院 (数据归属范围)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: String,
    pub name: String,
}

// ==========================================
// Department - 院系
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub faculty_id: String,
    pub name: String,
}

// ==========================================
// Level - 年级 (考生批次)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub department_id: String,
    pub name: String,
    pub matric_format: String, // 学号前缀，例如 "CSC/2021/"
}

impl Level {
    /// 由学号前缀与考生序号拼出完整学号
    ///
    /// # 参数
    /// - `separator`: 前缀与序号之间的分隔串（配置项 matric_separator）
    /// - `matric_no`: 考生序号
    pub fn real_matric(&self, separator: &str, matric_no: &str) -> String {
        format!("{}{}{}", self.matric_format, separator, matric_no)
    }
}

// ==========================================
// Student - 考生
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub level_id: String,
    pub matric_no: String,   // 年级内序号（名册排序键）
    pub name: String,
    pub real_matric: String, // 完整学号（考生查询入口）
}

// ==========================================
// LevelRoster - 年级有序名册
// ==========================================
// 用途: Seating Interleaver 切片输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRoster {
    pub level_id: String,
    pub student_ids: Vec<String>, // 已按 matric_no 升序
}

impl LevelRoster {
    pub fn new(level_id: impl Into<String>, student_ids: Vec<String>) -> Self {
        Self {
            level_id: level_id.into(),
            student_ids,
        }
    }

    pub fn len(&self) -> usize {
        self.student_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.student_ids.is_empty()
    }
}
