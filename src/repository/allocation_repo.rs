// ==========================================
// 考场座位编排系统 - 分配结果数据仓储
// ==========================================
// 职责: exam_distribution / seat_assignment 的整体替换与查询
// 红线: "先删后插" 必须在同一事务内完成，失败时保留原有结果
// ==========================================

use crate::domain::allocation::{Distribution, SeatAssignment};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 考生座位查询行（考生查询入口使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSeatRow {
    pub exam_id: String,
    pub exam_title: String,
    pub exam_date: NaiveDate,
    pub hall_id: String,
    pub hall_name: String,
    pub hall_code: String,
    pub seat_number: u32,
}

// ==========================================
// AllocationRepository - 分配结果仓储
// ==========================================
pub struct AllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRepository {
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

    // ==========================================
    // 分流记录
    // ==========================================

    /// 整体替换场次分流记录
    ///
    /// # 参数
    /// - `exam_id`: 场次ID
    /// - `distributions`: 新分流记录（列表顺序写入 row_no）
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    /// - Err: 数据库错误（事务回滚，原记录保留）
    pub fn replace_distributions(
        &self,
        exam_id: &str,
        distributions: &[Distribution],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM exam_distribution WHERE exam_id = ?1",
            params![exam_id],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO exam_distribution (
                    exam_id, row_no, hall_id, level_id,
                    allocated_count, start_index, end_index
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;

            for (row_no, dist) in distributions.iter().enumerate() {
                if dist.exam_id != exam_id {
                    return Err(RepositoryError::ValidationError(format!(
                        "分流记录场次不一致: expected={}, actual={}",
                        exam_id, dist.exam_id
                    )));
                }

                stmt.execute(params![
                    exam_id,
                    row_no as i64,
                    dist.hall_id,
                    dist.level_id,
                    dist.allocated_count,
                    dist.start_index,
                    dist.end_index,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(distributions.len())
    }

    /// 查询场次分流记录（按生成顺序）
    pub fn find_distributions(&self, exam_id: &str) -> RepositoryResult<Vec<Distribution>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT exam_id, hall_id, level_id, allocated_count, start_index, end_index
            FROM exam_distribution
            WHERE exam_id = ?1
            ORDER BY row_no
            "#,
        )?;

        let distributions = stmt
            .query_map(params![exam_id], |row| {
                Ok(Distribution {
                    exam_id: row.get(0)?,
                    hall_id: row.get(1)?,
                    level_id: row.get(2)?,
                    allocated_count: row.get(3)?,
                    start_index: row.get(4)?,
                    end_index: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<Distribution>>>()?;

        Ok(distributions)
    }

    // ==========================================
    // 座位表
    // ==========================================

    /// 整体替换场次座位表
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    /// - Err: 数据库错误（事务回滚，原座位表保留）
    pub fn replace_seat_assignments(
        &self,
        exam_id: &str,
        seats: &[SeatAssignment],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM seat_assignment WHERE exam_id = ?1",
            params![exam_id],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO seat_assignment (exam_id, hall_id, student_id, seat_number)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;

            for seat in seats {
                if seat.exam_id != exam_id {
                    return Err(RepositoryError::ValidationError(format!(
                        "座位记录场次不一致: expected={}, actual={}",
                        exam_id, seat.exam_id
                    )));
                }

                stmt.execute(params![exam_id, seat.hall_id, seat.student_id, seat.seat_number])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(seats.len())
    }

    /// 查询场次座位表（按考场 sort_key、座位号）
    pub fn find_seat_assignments(&self, exam_id: &str) -> RepositoryResult<Vec<SeatAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sa.exam_id, sa.hall_id, sa.student_id, sa.seat_number
            FROM seat_assignment sa
            LEFT JOIN exam_hall eh ON eh.exam_id = sa.exam_id AND eh.hall_id = sa.hall_id
            WHERE sa.exam_id = ?1
            ORDER BY eh.sort_key, sa.hall_id, sa.seat_number
            "#,
        )?;

        let seats = stmt
            .query_map(params![exam_id], |row| {
                Ok(SeatAssignment {
                    exam_id: row.get(0)?,
                    hall_id: row.get(1)?,
                    student_id: row.get(2)?,
                    seat_number: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<SeatAssignment>>>()?;

        Ok(seats)
    }

    pub fn count_seat_assignments(&self, exam_id: &str) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM seat_assignment WHERE exam_id = ?1",
            params![exam_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// 查询考生的全部座位（考试日期升序）
    pub fn find_seats_by_student(&self, student_id: &str) -> RepositoryResult<Vec<StudentSeatRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT e.exam_id, e.title, e.exam_date, h.hall_id, h.name, h.code, sa.seat_number
            FROM seat_assignment sa
            JOIN exam_event e ON e.exam_id = sa.exam_id
            JOIN hall h ON h.hall_id = sa.hall_id
            WHERE sa.student_id = ?1
            ORDER BY e.exam_date ASC, e.exam_id
            "#,
        )?;

        let rows = stmt
            .query_map(params![student_id], |row| {
                Ok(StudentSeatRow {
                    exam_id: row.get(0)?,
                    exam_title: row.get(1)?,
                    exam_date: row.get(2)?,
                    hall_id: row.get(3)?,
                    hall_name: row.get(4)?,
                    hall_code: row.get(5)?,
                    seat_number: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<StudentSeatRow>>>()?;

        Ok(rows)
    }
}
