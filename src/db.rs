// ==========================================
// 考场座位编排系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有连接的 PRAGMA 行为（外键级联删除依赖 foreign_keys=ON）
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表脚本幂等，可在每次启动时执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）并登记 schema_version
///
/// 说明：
/// - exam_hall / exam_level 的 sort_key 决定分配时的迭代顺序
/// - exam_distribution.row_no 保存阶段一的生成顺序，阶段二按此顺序回读
/// - 两类输出表对 exam_event 级联删除
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS faculty (
            faculty_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS hall (
            hall_id TEXT PRIMARY KEY,
            faculty_id TEXT NOT NULL REFERENCES faculty(faculty_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            capacity INTEGER NOT NULL CHECK (capacity > 0),
            UNIQUE (faculty_id, code)
        );

        CREATE TABLE IF NOT EXISTS department (
            department_id TEXT PRIMARY KEY,
            faculty_id TEXT NOT NULL REFERENCES faculty(faculty_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            UNIQUE (faculty_id, name)
        );

        CREATE TABLE IF NOT EXISTS level (
            level_id TEXT PRIMARY KEY,
            department_id TEXT NOT NULL REFERENCES department(department_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            matric_format TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS student (
            student_id TEXT PRIMARY KEY,
            level_id TEXT NOT NULL REFERENCES level(level_id) ON DELETE CASCADE,
            matric_no TEXT NOT NULL,
            name TEXT NOT NULL,
            real_matric TEXT NOT NULL,
            UNIQUE (level_id, matric_no)
        );
        CREATE INDEX IF NOT EXISTS idx_student_real_matric ON student(real_matric);

        CREATE TABLE IF NOT EXISTS exam_event (
            exam_id TEXT PRIMARY KEY,
            faculty_id TEXT NOT NULL REFERENCES faculty(faculty_id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            exam_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS exam_hall (
            exam_id TEXT NOT NULL REFERENCES exam_event(exam_id) ON DELETE CASCADE,
            hall_id TEXT NOT NULL REFERENCES hall(hall_id) ON DELETE CASCADE,
            sort_key INTEGER NOT NULL,
            PRIMARY KEY (exam_id, hall_id)
        );

        CREATE TABLE IF NOT EXISTS exam_level (
            exam_id TEXT NOT NULL REFERENCES exam_event(exam_id) ON DELETE CASCADE,
            level_id TEXT NOT NULL REFERENCES level(level_id) ON DELETE CASCADE,
            sort_key INTEGER NOT NULL,
            PRIMARY KEY (exam_id, level_id)
        );

        CREATE TABLE IF NOT EXISTS exam_distribution (
            exam_id TEXT NOT NULL REFERENCES exam_event(exam_id) ON DELETE CASCADE,
            row_no INTEGER NOT NULL,
            hall_id TEXT NOT NULL REFERENCES hall(hall_id) ON DELETE CASCADE,
            level_id TEXT NOT NULL REFERENCES level(level_id) ON DELETE CASCADE,
            allocated_count INTEGER NOT NULL,
            start_index INTEGER NOT NULL,
            end_index INTEGER NOT NULL,
            PRIMARY KEY (exam_id, row_no),
            UNIQUE (exam_id, hall_id, level_id)
        );

        CREATE TABLE IF NOT EXISTS seat_assignment (
            exam_id TEXT NOT NULL REFERENCES exam_event(exam_id) ON DELETE CASCADE,
            hall_id TEXT NOT NULL REFERENCES hall(hall_id) ON DELETE CASCADE,
            student_id TEXT NOT NULL REFERENCES student(student_id) ON DELETE CASCADE,
            seat_number INTEGER NOT NULL CHECK (seat_number >= 1),
            PRIMARY KEY (exam_id, hall_id, seat_number),
            UNIQUE (exam_id, student_id)
        );
        CREATE INDEX IF NOT EXISTS idx_seat_assignment_student ON seat_assignment(student_id);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            exam_id TEXT REFERENCES exam_event(exam_id) ON DELETE SET NULL,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
