//! pmsg 转储读取
//!
//! 读取 pstore 导出的 pmsg 环形缓冲区内容，容错扫描出所有记录

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::constants::{LogId, LOGGER_MAGIC, RECORD_HEADER_SIZE};
use crate::entry::PmsgEntry;
use crate::error::PmsgError;
use crate::files::{FileFilter, PmsgFiles};

/// 统计信息
#[derive(Debug, Clone, Default)]
pub struct PmsgStats {
    pub total_bytes: usize,
    pub records: usize,
    /// 解析失败而跳过的位置数
    pub corrupted: usize,
    /// 各日志缓冲区的记录数
    pub per_log_id: BTreeMap<LogId, usize>,
}

impl std::fmt::Display for PmsgStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pmsg Statistics:")?;
        writeln!(f, "  Size: {} bytes", self.total_bytes)?;
        writeln!(f, "  Records: {}", self.records)?;
        writeln!(f, "  Corrupted: {}", self.corrupted)?;
        for (id, count) in &self.per_log_id {
            writeln!(f, "  {}: {} records", id, count)?;
        }
        Ok(())
    }
}

/// 已扫描的 pmsg 转储
#[derive(Debug, Clone)]
pub struct PmsgLog {
    entries: Vec<PmsgEntry>,
    corrupted: usize,
    total_bytes: usize,
}

impl PmsgLog {
    /// 打开 pmsg 转储文件
    ///
    /// pstore 区域大小固定，整体读入内存
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PmsgError> {
        let data = fs::read(path.as_ref())?;
        Ok(Self::from_bytes(&data))
    }

    /// 容错扫描 - 跳过损坏数据
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut entries = Vec::new();
        let mut corrupted = 0;

        let mut pos = 0;
        while pos + RECORD_HEADER_SIZE < data.len() {
            // 找魔数
            if data[pos] != LOGGER_MAGIC {
                pos += 1;
                continue;
            }

            if let Some((entry, size)) = PmsgEntry::deserialize(&data[pos..]) {
                entries.push(entry);
                pos += size;
            } else {
                corrupted += 1;
                pos += 1;
            }
        }

        Self {
            entries,
            corrupted,
            total_bytes: data.len(),
        }
    }

    /// 所有记录，按缓冲区顺序
    pub fn entries(&self) -> &[PmsgEntry] {
        &self.entries
    }

    pub fn corrupted(&self) -> usize {
        self.corrupted
    }

    pub fn stats(&self) -> PmsgStats {
        let mut per_log_id = BTreeMap::new();
        for entry in &self.entries {
            *per_log_id.entry(entry.header.log_id).or_insert(0) += 1;
        }

        PmsgStats {
            total_bytes: self.total_bytes,
            records: self.entries.len(),
            corrupted: self.corrupted,
            per_log_id,
        }
    }

    /// 按过滤条件重组文件记录
    pub fn into_files(self, filter: &FileFilter) -> PmsgFiles {
        PmsgFiles::collect(self.entries, filter)
    }
}
