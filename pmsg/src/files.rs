//! 文件记录重组
//!
//! 一个文件被拆成若干条记录写入 pmsg：tag 为 `dir:base`，nsec 字段为分片序列号。
//! 同一次写入的分片共用 realtime 秒。这里按 (文件名, 缓冲区, 优先级) 归并分片，
//! 只保留秒数最新的那一版；同一版内同一序列号以后写入的为准，再按序列号拼接还原文件内容。

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::constants::{priority, LogId};
use crate::entry::PmsgEntry;

/// 文件过滤条件
#[derive(Debug, Clone)]
pub struct FileFilter {
    pub log_id: LogId,
    /// 最低优先级（含）
    pub min_priority: u8,
    /// 文件名前缀，例如 "recovery/"
    pub prefix: String,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            log_id: LogId::SYSTEM,
            min_priority: priority::INFO,
            prefix: "recovery/".to_string(),
        }
    }
}

impl FileFilter {
    fn accepts(&self, entry: &PmsgEntry, name: &str) -> bool {
        entry.header.log_id == self.log_id
            && entry.priority() >= self.min_priority
            && name.starts_with(&self.prefix)
    }
}

/// 重组后的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmsgFile {
    pub log_id: LogId,
    pub priority: u8,
    /// 还原后的文件名，例如 "recovery/last_log"
    pub name: String,
    pub content: Vec<u8>,
}

/// 轮转排序键：先按主干名，再按数字后缀降序，无后缀的排最后
///
/// last_log.10, last_log.9, ..., last_log.1, last_log
fn rotation_key(name: &str) -> (&str, Reverse<u32>) {
    if let Some((stem, suffix)) = name.rsplit_once('.') {
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = suffix.parse::<u32>() {
                return (stem, Reverse(n));
            }
        }
    }
    (name, Reverse(0))
}

/// 一个文件最新一版的分片
#[derive(Default)]
struct Version {
    sec: u32,
    chunks: BTreeMap<u32, Vec<u8>>,
}

impl Version {
    fn insert(&mut self, sec: u32, seq: u32, chunk: Vec<u8>) {
        if self.chunks.is_empty() || sec > self.sec {
            // 新一版整体替换，旧版多出的分片不能留下
            self.sec = sec;
            self.chunks.clear();
        } else if sec < self.sec {
            return;
        }
        self.chunks.insert(seq, chunk);
    }
}

/// 文件迭代器 - 有限、只能遍历一次
#[derive(Debug)]
pub struct PmsgFiles {
    files: std::vec::IntoIter<PmsgFile>,
}

impl PmsgFiles {
    pub(crate) fn collect(entries: Vec<PmsgEntry>, filter: &FileFilter) -> Self {
        let mut groups: BTreeMap<(String, LogId, u8), Version> = BTreeMap::new();

        for entry in entries {
            let Some(seq) = entry.header.file_sequence() else {
                continue;
            };
            let Some(name) = entry.file_name() else {
                continue;
            };
            if !filter.accepts(&entry, &name) {
                continue;
            }

            let key = (name, entry.header.log_id, entry.priority());
            groups
                .entry(key)
                .or_default()
                .insert(entry.header.sec, seq, entry.message().to_vec());
        }

        let mut files: Vec<PmsgFile> = groups
            .into_iter()
            .map(|((name, log_id, priority), version)| PmsgFile {
                log_id,
                priority,
                name,
                content: version.chunks.into_values().flatten().collect(),
            })
            .collect();

        files.sort_by(|a, b| {
            rotation_key(&a.name)
                .cmp(&rotation_key(&b.name))
                .then_with(|| a.log_id.cmp(&b.log_id))
                .then_with(|| a.priority.cmp(&b.priority))
        });

        Self {
            files: files.into_iter(),
        }
    }
}

impl Iterator for PmsgFiles {
    type Item = PmsgFile;

    fn next(&mut self) -> Option<Self::Item> {
        self.files.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}
