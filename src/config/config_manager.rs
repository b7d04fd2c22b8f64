// ==========================================
// 考场座位编排系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 默认考场容量上限
pub const DEFAULT_MAX_HALL_CAPACITY: u32 = 2000;

/// 默认学号分隔串
pub const DEFAULT_MATRIC_SEPARATOR: &str = "0";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn update_config(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 分配配置 =====

    /// 新建考场允许的最大容量
    pub fn get_max_hall_capacity(&self) -> Result<u32, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::MAX_HALL_CAPACITY,
            &DEFAULT_MAX_HALL_CAPACITY.to_string(),
        )?;
        Ok(value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_MAX_HALL_CAPACITY))
    }

    /// 分流完成后是否自动生成座位表
    pub fn get_auto_seat_after_distribution(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::AUTO_SEAT_AFTER_DISTRIBUTION, "true")?;
        Ok(match value.trim().to_lowercase().as_str() {
            "false" | "0" | "no" => false,
            _ => true,
        })
    }

    /// 学号前缀与序号之间的分隔串
    pub fn get_matric_separator(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::MATRIC_SEPARATOR, DEFAULT_MATRIC_SEPARATOR)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 考场
    pub const MAX_HALL_CAPACITY: &str = "max_hall_capacity";

    // 分配流程
    pub const AUTO_SEAT_AFTER_DISTRIBUTION: &str = "auto_seat_after_distribution";

    // 学号
    pub const MATRIC_SEPARATOR: &str = "matric_separator";
}
