// ==========================================
// 考场座位编排系统 - 院系/年级/考生数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 名册顺序固定为 matric_no 升序（student_id 兜底）
// ==========================================

use crate::domain::roster::{Department, Level, LevelRoster, Student};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// RosterRepository - 名册仓储
// ==========================================
/// 名册仓储
/// 职责: 管理 department / level / student 表
pub struct RosterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RosterRepository {
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
    // 院系
    // ==========================================

    pub fn insert_department(&self, department: &Department) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO department (department_id, faculty_id, name) VALUES (?1, ?2, ?3)",
            params![department.id, department.faculty_id, department.name],
        )?;
        Ok(())
    }

    pub fn find_department(&self, department_id: &str) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        let department = conn
            .query_row(
                "SELECT department_id, faculty_id, name FROM department WHERE department_id = ?1",
                params![department_id],
                |row| {
                    Ok(Department {
                        id: row.get(0)?,
                        faculty_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(department)
    }

    pub fn list_departments(&self, faculty_id: &str) -> RepositoryResult<Vec<Department>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT department_id, faculty_id, name
            FROM department
            WHERE faculty_id = ?1
            ORDER BY name
            "#,
        )?;

        let departments = stmt
            .query_map(params![faculty_id], |row| {
                Ok(Department {
                    id: row.get(0)?,
                    faculty_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<Department>>>()?;

        Ok(departments)
    }

    /// 删除院系（级联删除年级、考生）
    pub fn delete_department(&self, department_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM department WHERE department_id = ?1",
            params![department_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Department".to_string(),
                id: department_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn count_departments_by_faculty(&self, faculty_id: &str) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM department WHERE faculty_id = ?1",
            params![faculty_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    // ==========================================
    // 年级
    // ==========================================

    pub fn insert_level(&self, level: &Level) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO level (level_id, department_id, name, matric_format)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![level.id, level.department_id, level.name, level.matric_format],
        )?;
        Ok(())
    }

    pub fn find_level(&self, level_id: &str) -> RepositoryResult<Option<Level>> {
        let conn = self.get_conn()?;
        let level = conn
            .query_row(
                r#"
                SELECT level_id, department_id, name, matric_format
                FROM level
                WHERE level_id = ?1
                "#,
                params![level_id],
                map_level_row,
            )
            .optional()?;
        Ok(level)
    }

    pub fn list_levels(&self, department_id: &str) -> RepositoryResult<Vec<Level>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT level_id, department_id, name, matric_format
            FROM level
            WHERE department_id = ?1
            ORDER BY name
            "#,
        )?;

        let levels = stmt
            .query_map(params![department_id], map_level_row)?
            .collect::<SqliteResult<Vec<Level>>>()?;

        Ok(levels)
    }

    pub fn delete_level(&self, level_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM level WHERE level_id = ?1", params![level_id])?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Level".to_string(),
                id: level_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 考生
    // ==========================================

    pub fn insert_student(&self, student: &Student) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO student (student_id, level_id, matric_no, name, real_matric)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                student.id,
                student.level_id,
                student.matric_no,
                student.name,
                student.real_matric
            ],
        )?;
        Ok(())
    }

    /// 批量插入考生（同年级重复 matric_no 跳过）
    ///
    /// # 返回
    /// - Ok(usize): 实际插入的记录数
    pub fn insert_students(&self, students: &[Student]) -> RepositoryResult<usize> {
        if students.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO student (student_id, level_id, matric_no, name, real_matric)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;

            for student in students {
                inserted += stmt.execute(params![
                    student.id,
                    student.level_id,
                    student.matric_no,
                    student.name,
                    student.real_matric
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(inserted)
    }

    /// 按名册顺序查询年级考生
    pub fn list_students(&self, level_id: &str) -> RepositoryResult<Vec<Student>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT student_id, level_id, matric_no, name, real_matric
            FROM student
            WHERE level_id = ?1
            ORDER BY matric_no, student_id
            "#,
        )?;

        let students = stmt
            .query_map(params![level_id], map_student_row)?
            .collect::<SqliteResult<Vec<Student>>>()?;

        Ok(students)
    }

    /// 读取年级有序名册（仅ID）
    pub fn load_roster(&self, level_id: &str) -> RepositoryResult<LevelRoster> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT student_id
            FROM student
            WHERE level_id = ?1
            ORDER BY matric_no, student_id
            "#,
        )?;

        let student_ids = stmt
            .query_map(params![level_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<String>>>()?;

        Ok(LevelRoster::new(level_id, student_ids))
    }

    pub fn count_students(&self, level_id: &str) -> RepositoryResult<u32> {
        let conn = self.get_conn()?;
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM student WHERE level_id = ?1",
            params![level_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_students_by_faculty(&self, faculty_id: &str) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM student s
            JOIN level l ON l.level_id = s.level_id
            JOIN department d ON d.department_id = l.department_id
            WHERE d.faculty_id = ?1
            "#,
            params![faculty_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// 按完整学号查询考生（考生查询入口）
    pub fn find_student_by_real_matric(&self, real_matric: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let student = conn
            .query_row(
                r#"
                SELECT student_id, level_id, matric_no, name, real_matric
                FROM student
                WHERE real_matric = ?1
                ORDER BY student_id
                LIMIT 1
                "#,
                params![real_matric],
                map_student_row,
            )
            .optional()?;
        Ok(student)
    }

    pub fn delete_student(&self, student_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM student WHERE student_id = ?1",
            params![student_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: student_id.to_string(),
            });
        }
        Ok(())
    }
}

/// level 行映射（列顺序: level_id, department_id, name, matric_format）
pub(crate) fn map_level_row(row: &Row<'_>) -> SqliteResult<Level> {
    Ok(Level {
        id: row.get(0)?,
        department_id: row.get(1)?,
        name: row.get(2)?,
        matric_format: row.get(3)?,
    })
}

fn map_student_row(row: &Row<'_>) -> SqliteResult<Student> {
    Ok(Student {
        id: row.get(0)?,
        level_id: row.get(1)?,
        matric_no: row.get(2)?,
        name: row.get(3)?,
        real_matric: row.get(4)?,
    })
}
