//! pmsg - pstore 持久化日志读取
//!
//! 特性：
//! - 容错扫描：跳过损坏数据，按魔数重新同步
//! - 文件重组：按分片序列号拼接 `dir:base` 文件记录
//! - 轮转顺序：旧的 last_log.N 先于 last_log 交付
//! - 写入器：生成与设备一致的 pmsg 记录流

pub mod constants;
pub mod entry;
pub mod error;
pub mod files;
pub mod header;
pub mod pmsg_log;
pub mod writer;


pub use constants::{priority, LogId, DEFAULT_PMSG_PATH};
pub use entry::PmsgEntry;
pub use error::PmsgError;
pub use files::{FileFilter, PmsgFile, PmsgFiles};
pub use header::RecordHeader;
pub use pmsg_log::{PmsgLog, PmsgStats};
pub use writer::PmsgWriter;
