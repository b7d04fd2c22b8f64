// ==========================================
// 考场座位编排系统 - 操作日志领域模型
// ==========================================
// 红线: 每次成功的分配生成都必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub exam_id: Option<String>, // 场次删除后置空
    pub action_type: String,     // 存储为字符串
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateExam,
    GenerateDistribution,
    GenerateSeating,
    DeleteExam,
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateExam => "CREATE_EXAM",
            ActionType::GenerateDistribution => "GENERATE_DISTRIBUTION",
            ActionType::GenerateSeating => "GENERATE_SEATING",
            ActionType::DeleteExam => "DELETE_EXAM",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE_EXAM" => Some(ActionType::CreateExam),
            "GENERATE_DISTRIBUTION" => Some(ActionType::GenerateDistribution),
            "GENERATE_SEATING" => Some(ActionType::GenerateSeating),
            "DELETE_EXAM" => Some(ActionType::DeleteExam),
            _ => None,
        }
    }
}

impl ActionLog {
    /// 构造一条新日志（生成 action_id，时间取本地当前时间）
    pub fn new(
        exam_id: Option<String>,
        action_type: ActionType,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            exam_id,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}
