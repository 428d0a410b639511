//! Comanda Core — restaurant order management engine
//!
//! Single-writer core behind the (out-of-scope) ordering UI. It owns the
//! order lifecycle: identifier generation, the in-memory working set, and
//! transactional SQLite persistence of the full order graph.
//!
//! # 模块结构
//!
//! ```text
//! comanda-core/src/
//! ├── core/      # 配置
//! ├── db/        # SQLite 连接池、迁移、仓储
//! ├── orders/    # 订单号生成、编排服务
//! └── utils/     # 错误、日志、时间工具
//! ```
//!
//! # Typical startup
//!
//! ```ignore
//! let config = Config::from_env();
//! init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
//! let db = DbService::new(&config.db_path()).await?;
//! let mut service = OrderService::new(&db, config.timezone).await;
//! service.load_open_orders().await?;
//! ```

pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use self::core::Config;
pub use db::DbService;
pub use orders::{OrderNumberGenerator, OrderService};
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResult};
