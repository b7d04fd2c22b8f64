// ==========================================
// 考场座位编排系统 - 学院/考场数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::hall::Hall;
use crate::domain::roster::Faculty;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// HallRepository - 考场仓储
// ==========================================
/// 考场仓储
/// 职责: 管理 faculty / hall 表
pub struct HallRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HallRepository {
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
    // 学院
    // ==========================================

    pub fn insert_faculty(&self, faculty: &Faculty) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO faculty (faculty_id, name) VALUES (?1, ?2)",
            params![faculty.id, faculty.name],
        )?;
        Ok(())
    }

    pub fn find_faculty(&self, faculty_id: &str) -> RepositoryResult<Option<Faculty>> {
        let conn = self.get_conn()?;
        let faculty = conn
            .query_row(
                "SELECT faculty_id, name FROM faculty WHERE faculty_id = ?1",
                params![faculty_id],
                |row| {
                    Ok(Faculty {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(faculty)
    }

    // ==========================================
    // 考场
    // ==========================================

    /// 插入考场
    ///
    /// # 返回
    /// - Ok(()): 成功
    /// - Err(UniqueConstraintViolation): 同学院考场编码重复
    pub fn insert(&self, hall: &Hall) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO hall (hall_id, faculty_id, name, code, capacity)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![hall.id, hall.faculty_id, hall.name, hall.code, hall.capacity],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, hall_id: &str) -> RepositoryResult<Option<Hall>> {
        let conn = self.get_conn()?;
        let hall = conn
            .query_row(
                r#"
                SELECT hall_id, faculty_id, name, code, capacity
                FROM hall
                WHERE hall_id = ?1
                "#,
                params![hall_id],
                map_hall_row,
            )
            .optional()?;
        Ok(hall)
    }

    /// 按学院查询考场列表（按名称排序）
    pub fn list_by_faculty(&self, faculty_id: &str) -> RepositoryResult<Vec<Hall>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT hall_id, faculty_id, name, code, capacity
            FROM hall
            WHERE faculty_id = ?1
            ORDER BY name, hall_id
            "#,
        )?;

        let halls = stmt
            .query_map(params![faculty_id], map_hall_row)?
            .collect::<SqliteResult<Vec<Hall>>>()?;

        Ok(halls)
    }

    /// 更新考场容量
    ///
    /// 说明: 已生成的分配不会自动失效，需要调用方重新生成
    pub fn update_capacity(&self, hall_id: &str, capacity: u32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE hall SET capacity = ?1 WHERE hall_id = ?2",
            params![capacity, hall_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Hall".to_string(),
                id: hall_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete(&self, hall_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM hall WHERE hall_id = ?1", params![hall_id])?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Hall".to_string(),
                id: hall_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn count_by_faculty(&self, faculty_id: &str) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM hall WHERE faculty_id = ?1",
            params![faculty_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

/// hall 行映射（列顺序: hall_id, faculty_id, name, code, capacity）
pub(crate) fn map_hall_row(row: &Row<'_>) -> SqliteResult<Hall> {
    Ok(Hall {
        id: row.get(0)?,
        faculty_id: row.get(1)?,
        name: row.get(2)?,
        code: row.get(3)?,
        capacity: row.get(4)?,
    })
}
