//! pmsg 文件落盘
//!
//! 每个重组出的文件调用一次 `save`：内容与目标文件相同则跳过；
//! 不同则写入，本次运行第一次写入前先轮转 last_log / last_kmsg。

use pmsg::PmsgFile;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::PersistConfig;
use crate::rotate::Rotate;

/// 排空统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub records: usize,
    /// 内容与目标相同而跳过的
    pub unchanged: usize,
    pub written: usize,
    pub failed: usize,
}

/// 排空结果，rotated 交给后续的控制台日志对账使用
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub rotated: bool,
    pub stats: DrainStats,
}

enum Saved {
    Unchanged(usize),
    Written(usize),
}

pub struct PmsgSink<'a> {
    log_root: &'a Path,
    last_log: &'a Path,
    last_kmsg: &'a Path,
    rotator: &'a dyn Rotate,
    rotated: bool,
    stats: DrainStats,
}

impl<'a> PmsgSink<'a> {
    pub fn new(config: &'a PersistConfig, rotator: &'a dyn Rotate) -> Self {
        Self {
            log_root: &config.log_root,
            last_log: &config.last_log,
            last_kmsg: &config.last_kmsg,
            rotator,
            rotated: false,
            stats: DrainStats::default(),
        }
    }

    /// 文件名拼到根目录下，不允许绝对路径或 ".."
    pub fn destination(&self, name: &str) -> Option<PathBuf> {
        let rel = Path::new(name);
        let safe = rel.components().all(|c| matches!(c, Component::Normal(_)));
        (safe && !name.is_empty()).then(|| self.log_root.join(rel))
    }

    /// 保存一个文件，返回处理的字节数
    pub fn save(&mut self, file: &PmsgFile) -> io::Result<usize> {
        self.store(file).map(|saved| match saved {
            Saved::Unchanged(n) | Saved::Written(n) => n,
        })
    }

    fn store(&mut self, file: &PmsgFile) -> io::Result<Saved> {
        let destination = self.destination(&file.name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing file name {:?}", file.name),
            )
        })?;

        // 不存在按空内容处理
        let existing = match fs::read(&destination) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!("Can't read {}: {}", destination.display(), e);
                }
                Vec::new()
            }
        };

        if existing == file.content {
            debug!("{} unchanged", destination.display());
            return Ok(Saved::Unchanged(file.content.len()));
        }

        if !self.rotated {
            self.rotator.rotate(self.last_log, self.last_kmsg);
            self.rotated = true;
        }

        fs::write(&destination, &file.content)?;
        info!(
            "Saved {} ({} bytes)",
            destination.display(),
            file.content.len()
        );
        Ok(Saved::Written(file.content.len()))
    }

    /// 按顺序处理所有文件，失败只记录日志
    pub fn drain<I: IntoIterator<Item = PmsgFile>>(&mut self, files: I) {
        for file in files {
            self.stats.records += 1;

            match self.store(&file) {
                Ok(Saved::Unchanged(_)) => self.stats.unchanged += 1,
                Ok(Saved::Written(_)) => self.stats.written += 1,
                Err(e) => {
                    self.stats.failed += 1;
                    match e.kind() {
                        io::ErrorKind::InvalidInput => warn!("Skipping pmsg file: {}", e),
                        _ => error!("Failed to save {}: {}", file.name, e),
                    }
                }
            }
        }
    }

    pub fn rotated(&self) -> bool {
        self.rotated
    }

    pub fn finish(self) -> DrainOutcome {
        DrainOutcome {
            rotated: self.rotated,
            stats: self.stats,
        }
    }
}
