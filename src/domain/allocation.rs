// ==========================================
// 考场座位编排系统 - 分配结果领域模型
// ==========================================
// 职责: 定义分配引擎的输入摘要与两阶段输出
// 生命周期: 每次重新生成时按场次整体替换，不做局部更新
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// 引擎输入
// ==========================================

/// 考场容量（按场次考场顺序排列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallCapacity {
    pub hall_id: String,
    pub capacity: u32,
}

impl HallCapacity {
    pub fn new(hall_id: impl Into<String>, capacity: u32) -> Self {
        Self {
            hall_id: hall_id.into(),
            capacity,
        }
    }
}

/// 年级人数（按场次年级顺序排列）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRosterSize {
    pub level_id: String,
    pub student_count: u32,
}

impl LevelRosterSize {
    pub fn new(level_id: impl Into<String>, student_count: u32) -> Self {
        Self {
            level_id: level_id.into(),
            student_count,
        }
    }
}

// ==========================================
// Distribution - 年级到考场的分流记录 (阶段一输出)
// ==========================================
// 不变量: allocated_count = end_index - start_index + 1
// 不变量: 同一年级的所有区间恰好覆盖 [0, 年级人数 - 1]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub exam_id: String,
    pub hall_id: String,
    pub level_id: String,
    pub allocated_count: u32,
    pub start_index: u32, // 名册下标，闭区间
    pub end_index: u32,
}

// ==========================================
// SeatAssignment - 座位分配记录 (阶段二输出)
// ==========================================
// 不变量: 同一 (exam_id, hall_id) 内 seat_number 为 1..=N 连续无重复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub exam_id: String,
    pub hall_id: String,
    pub student_id: String,
    pub seat_number: u32,
}

// ==========================================
// AllocationSummary - 单次生成摘要
// ==========================================
// 用途: 操作日志 payload / API 返回
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub exam_id: String,
    pub hall_count: usize,
    pub level_count: usize,
    pub total_capacity: u64,
    pub total_students: u64,
    pub distribution_count: usize,
    pub seat_count: usize,
}
