//! Engine configuration
//!
//! All values can be overridden through environment variables:
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | . | 工作目录 (数据库、日志) |
//! | DB_FILE | orders.db | SQLite 数据库文件名 |
//! | LOG_LEVEL | info | 日志级别 |
//! | LOG_DIR | (unset) | 设置后日志按天滚动写入该目录 |
//! | TIMEZONE | Europe/Madrid | 业务时区 (订单号按此日期滚动) |

use chrono_tz::Tz;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// SQLite database file name inside `work_dir`
    pub db_file: String,
    /// tracing filter level
    pub log_level: String,
    /// When set, logs also rotate daily into this directory
    pub log_dir: Option<String>,
    /// Business timezone; the daily order sequence resets on this
    /// timezone's date, not UTC
    pub timezone: Tz,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let timezone = std::env::var("TIMEZONE")
            .ok()
            .and_then(|tz| tz.parse().ok())
            .unwrap_or(chrono_tz::Europe::Madrid);
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| ".".into()),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "orders.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            timezone,
        }
    }

    /// Full path of the SQLite database file
    pub fn db_path(&self) -> String {
        format!("{}/{}", self.work_dir.trim_end_matches('/'), self.db_file)
    }
}
