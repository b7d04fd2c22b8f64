// ==========================================
// 考场座位编排系统 - 分配引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 校验失败必须在任何删除/写入之前返回
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 分配引擎错误类型
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("考试场次不存在: exam_id={0}")]
    ExamNotFound(String),

    /// 总座位数不足以容纳全部考生
    #[error("考场容量不足: {total_capacity} 个座位, {total_students} 名考生")]
    InsufficientCapacity {
        total_capacity: u64,
        total_students: u64,
    },

    /// 分流记录与当前名册不一致（名册在分流后被修改等）
    #[error("分流记录无效: {0}")]
    InvalidDistribution(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type AllocationResult<T> = Result<T, AllocationError>;
