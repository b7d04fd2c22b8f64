// ==========================================
// 考场座位编排系统 - 考场领域模型
// ==========================================
// 职责: 考场实体与容量约束接口
// 红线: 考场容量在一次分配计算期间不可变化
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Hall - 考场
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    pub id: String,         // 考场ID
    pub faculty_id: String, // 所属学院
    pub name: String,       // 考场名称
    pub code: String,       // 考场编码
    pub capacity: u32,      // 座位容量 (正整数)
}

// ==========================================
// Trait: SeatCapacity
// ==========================================
// 用途: Distribution Planner 余量计算接口
pub trait SeatCapacity {
    /// 座位总数
    fn seat_capacity(&self) -> u32;

    /// 计算剩余座位
    ///
    /// # 参数
    /// - `allocated`: 已分配人数
    ///
    /// # 返回
    /// 剩余座位数（不小于 0）
    fn spare_seats(&self, allocated: u32) -> u32 {
        self.seat_capacity().saturating_sub(allocated)
    }
}

impl SeatCapacity for Hall {
    fn seat_capacity(&self) -> u32 {
        self.capacity
    }
}
