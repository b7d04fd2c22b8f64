// ==========================================
// 考场座位编排系统 - 考试场次数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 场次考场/年级一律按 sort_key 返回，作为分配迭代顺序
// ==========================================

use crate::domain::exam::ExamEvent;
use crate::domain::hall::Hall;
use crate::domain::roster::Level;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::hall_repo::map_hall_row;
use crate::repository::roster_repo::map_level_row;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 场次年级（附院系名称与考生人数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamLevelInfo {
    pub level: Level,
    pub department_name: String,
    pub student_count: u32,
    pub sort_key: i64,
}

/// 场次考场
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamHallInfo {
    pub hall: Hall,
    pub sort_key: i64,
}

// ==========================================
// ExamRepository - 考试场次仓储
// ==========================================
pub struct ExamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ExamRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建场次并挂载考场、年级
    ///
    /// # 参数
    /// - `exam`: 场次
    /// - `hall_ids`: 考场ID，列表位置即 sort_key
    /// - `level_ids`: 年级ID，列表位置即 sort_key
    ///
    /// # 红线
    /// - 必须在事务中完成，任一成员写入失败整体回滚
    pub fn insert(
        &self,
        exam: &ExamEvent,
        hall_ids: &[String],
        level_ids: &[String],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO exam_event (exam_id, faculty_id, title, exam_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                exam.id,
                exam.faculty_id,
                exam.title,
                exam.exam_date,
                exam.created_at
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO exam_hall (exam_id, hall_id, sort_key) VALUES (?1, ?2, ?3)",
            )?;
            for (sort_key, hall_id) in hall_ids.iter().enumerate() {
                stmt.execute(params![exam.id, hall_id, sort_key as i64])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO exam_level (exam_id, level_id, sort_key) VALUES (?1, ?2, ?3)",
            )?;
            for (sort_key, level_id) in level_ids.iter().enumerate() {
                stmt.execute(params![exam.id, level_id, sort_key as i64])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    pub fn find_by_id(&self, exam_id: &str) -> RepositoryResult<Option<ExamEvent>> {
        let conn = self.get_conn()?;
        let exam = conn
            .query_row(
                r#"
                SELECT exam_id, faculty_id, title, exam_date, created_at
                FROM exam_event
                WHERE exam_id = ?1
                "#,
                params![exam_id],
                map_exam_row,
            )
            .optional()?;
        Ok(exam)
    }

    /// 按学院查询场次（考试日期倒序）
    pub fn list_by_faculty(&self, faculty_id: &str) -> RepositoryResult<Vec<ExamEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT exam_id, faculty_id, title, exam_date, created_at
            FROM exam_event
            WHERE faculty_id = ?1
            ORDER BY exam_date DESC, created_at DESC
            "#,
        )?;

        let exams = stmt
            .query_map(params![faculty_id], map_exam_row)?
            .collect::<SqliteResult<Vec<ExamEvent>>>()?;

        Ok(exams)
    }

    /// 查询场次考场（按 sort_key）
    pub fn list_halls(&self, exam_id: &str) -> RepositoryResult<Vec<ExamHallInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT h.hall_id, h.faculty_id, h.name, h.code, h.capacity, eh.sort_key
            FROM exam_hall eh
            JOIN hall h ON h.hall_id = eh.hall_id
            WHERE eh.exam_id = ?1
            ORDER BY eh.sort_key, h.hall_id
            "#,
        )?;

        let halls = stmt
            .query_map(params![exam_id], |row| {
                Ok(ExamHallInfo {
                    hall: map_hall_row(row)?,
                    sort_key: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<ExamHallInfo>>>()?;

        Ok(halls)
    }

    /// 查询场次年级（按 sort_key），附考生人数
    pub fn list_levels(&self, exam_id: &str) -> RepositoryResult<Vec<ExamLevelInfo>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                l.level_id, l.department_id, l.name, l.matric_format,
                d.name,
                (SELECT COUNT(*) FROM student s WHERE s.level_id = l.level_id),
                el.sort_key
            FROM exam_level el
            JOIN level l ON l.level_id = el.level_id
            JOIN department d ON d.department_id = l.department_id
            WHERE el.exam_id = ?1
            ORDER BY el.sort_key, l.level_id
            "#,
        )?;

        let levels = stmt
            .query_map(params![exam_id], |row| {
                Ok(ExamLevelInfo {
                    level: map_level_row(row)?,
                    department_name: row.get(4)?,
                    student_count: row.get(5)?,
                    sort_key: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<ExamLevelInfo>>>()?;

        Ok(levels)
    }

    /// 删除场次（座位表、分流记录、成员关系一并删除）
    pub fn delete(&self, exam_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM seat_assignment WHERE exam_id = ?1", params![exam_id])?;
        tx.execute("DELETE FROM exam_distribution WHERE exam_id = ?1", params![exam_id])?;
        tx.execute("DELETE FROM exam_level WHERE exam_id = ?1", params![exam_id])?;
        tx.execute("DELETE FROM exam_hall WHERE exam_id = ?1", params![exam_id])?;
        let affected = tx.execute("DELETE FROM exam_event WHERE exam_id = ?1", params![exam_id])?;

        if affected == 0 {
            // tx 在此处 drop，自动回滚
            return Err(RepositoryError::NotFound {
                entity: "ExamEvent".to_string(),
                id: exam_id.to_string(),
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    pub fn count_by_faculty(&self, faculty_id: &str) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exam_event WHERE faculty_id = ?1",
            params![faculty_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn map_exam_row(row: &Row<'_>) -> SqliteResult<ExamEvent> {
    Ok(ExamEvent {
        id: row.get(0)?,
        faculty_id: row.get(1)?,
        title: row.get(2)?,
        exam_date: row.get(3)?,
        created_at: row.get(4)?,
    })
}
