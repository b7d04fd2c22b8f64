// ==========================================
// 考场座位编排系统 - 考试场次领域模型
// ==========================================
// 红线: 场次下的考场/年级迭代顺序由 sort_key 显式决定
// 说明: 不依赖插入顺序或数据库返回顺序
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ExamEvent - 考试场次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamEvent {
    pub id: String,
    pub faculty_id: String,
    pub title: String,
    pub exam_date: NaiveDate,
    pub created_at: NaiveDateTime,
}
