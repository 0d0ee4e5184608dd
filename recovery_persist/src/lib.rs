//! recovery-persist - 开机后把 pmsg 中的 recovery 日志转存到 /data/misc/recovery
//!
//! OTA 重启进入系统、/data 挂载之后运行一次：
//! - 从 pstore 的 pmsg 中取出 recovery 写入的文件
//! - 内容有变化时轮转 last_log / last_kmsg 后写入
//! - 与控制台快照对账，保持 last_kmsg 一致

pub mod compare;
pub mod config;
pub mod copy;
pub mod mounts;
pub mod persist;
pub mod reconcile;
pub mod rotate;
pub mod sink;

pub use compare::files_equal;
pub use config::PersistConfig;
pub use copy::copy_file;
pub use persist::{ExitReason, Gate, Persist, RunReport, Verdict};
pub use reconcile::{reconcile_console, ReconcileOutcome};
pub use rotate::{LogRotator, Rotate};
pub use sink::{DrainOutcome, DrainStats, PmsgSink};
