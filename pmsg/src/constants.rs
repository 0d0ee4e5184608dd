//! 常量定义
//!
//! pmsg 记录格式的各种常量和标记定义

/// 记录魔数 - 每条 pmsg 记录以 'l' 开头
pub const LOGGER_MAGIC: u8 = b'l';
/// pmsg 头大小 (magic + len + uid + pid)
pub const PMSG_HEADER_SIZE: usize = 1 + 2 + 2 + 2;
/// 日志头大小 (id + tid + sec + nsec)
pub const LOG_HEADER_SIZE: usize = 1 + 2 + 4 + 4;
/// 记录头总大小
pub const RECORD_HEADER_SIZE: usize = PMSG_HEADER_SIZE + LOG_HEADER_SIZE;
/// 单条记录最大长度（包括头）
pub const LOGGER_ENTRY_MAX_LEN: usize = 5 * 1024;
/// 单条记录最大负载
pub const LOGGER_ENTRY_MAX_PAYLOAD: usize = 4068;

/// 文件分片序列号步进（存放在 nsec 字段）
pub const PMSG_FILE_SEQUENCE: u32 = 1000;
/// 单个文件最多分片数
pub const PMSG_FILE_MAX_SEQUENCE: u32 = 256;

/// pstore 中 pmsg 数据的默认位置
pub const DEFAULT_PMSG_PATH: &str = "/sys/fs/pstore/pmsg-ramoops-0";

/// 日志缓冲区编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogId(pub u8);

impl LogId {
    pub const MAIN: LogId = LogId(0);
    pub const RADIO: LogId = LogId(1);
    pub const EVENTS: LogId = LogId(2);
    pub const SYSTEM: LogId = LogId(3);
    pub const CRASH: LogId = LogId(4);

    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "main",
            1 => "radio",
            2 => "events",
            3 => "system",
            4 => "crash",
            _ => "unknown",
        }
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

/// 日志优先级
pub mod priority {
    pub const VERBOSE: u8 = 2;
    pub const DEBUG: u8 = 3;
    pub const INFO: u8 = 4;
    pub const WARN: u8 = 5;
    pub const ERROR: u8 = 6;
    pub const FATAL: u8 = 7;
}
