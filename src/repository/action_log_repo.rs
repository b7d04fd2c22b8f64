// ==========================================
// 考场座位编排系统 - 操作日志数据仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, exam_id, action_type, action_ts, actor, payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.action_id,
                log.exam_id,
                log.action_type,
                log.action_ts,
                log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 查询场次的操作日志（时间升序）
    pub fn find_by_exam(&self, exam_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, exam_id, action_type, action_ts, actor, payload_json, detail
            FROM action_log
            WHERE exam_id = ?1
            ORDER BY action_ts, rowid
            "#,
        )?;

        let logs = stmt
            .query_map(params![exam_id], map_action_log_row)?
            .collect::<SqliteResult<Vec<ActionLog>>>()?;

        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn find_recent(&self, limit: u32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, exam_id, action_type, action_ts, actor, payload_json, detail
            FROM action_log
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit], map_action_log_row)?
            .collect::<SqliteResult<Vec<ActionLog>>>()?;

        Ok(logs)
    }
}

fn map_action_log_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
    let payload_raw: Option<String> = row.get(5)?;
    let payload_json = payload_raw.and_then(|raw| serde_json::from_str(&raw).ok());

    Ok(ActionLog {
        action_id: row.get(0)?,
        exam_id: row.get(1)?,
        action_type: row.get(2)?,
        action_ts: row.get(3)?,
        actor: row.get(4)?,
        payload_json,
        detail: row.get(6)?,
    })
}
