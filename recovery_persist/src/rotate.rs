//! 日志轮转
//!
//! last_log -> last_log.1 -> ... -> last_log.N，last_kmsg 同理

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 轮转接口：把当前日志挪到历史位置
pub trait Rotate {
    fn rotate(&self, last_log: &Path, last_kmsg: &Path);
}

/// 按代数保留历史的轮转器
///
/// 与平台实现一致，每个实例最多真正轮转一次，之后的请求直接忽略
#[derive(Debug)]
pub struct LogRotator {
    keep: usize,
    rotated: Cell<bool>,
}

impl LogRotator {
    pub fn new(keep: usize) -> Self {
        Self {
            keep,
            rotated: Cell::new(false),
        }
    }

    pub fn has_rotated(&self) -> bool {
        self.rotated.get()
    }
}

/// 第 i 代文件名，0 为当前文件本身
fn generation(path: &Path, i: usize) -> PathBuf {
    if i == 0 {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", i));
    PathBuf::from(name)
}

/// 重命名，源文件不存在不算错误
fn rename_generation(from: &Path, to: &Path) {
    match fs::rename(from, to) {
        Ok(()) => debug!("Renamed {} -> {}", from.display(), to.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to rename {} -> {}: {}",
            from.display(),
            to.display(),
            e
        ),
    }
}

impl Rotate for LogRotator {
    fn rotate(&self, last_log: &Path, last_kmsg: &Path) {
        if self.rotated.replace(true) {
            debug!("Logs already rotated, skipping");
            return;
        }

        // 从最旧的一代开始往后挪，覆盖 .keep
        for i in (0..self.keep).rev() {
            rename_generation(&generation(last_log, i), &generation(last_log, i + 1));
            rename_generation(&generation(last_kmsg, i), &generation(last_kmsg, i + 1));
        }
        info!(
            "Rotated {} and {} (keep {})",
            last_log.display(),
            last_kmsg.display(),
            self.keep
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generation_names() {
        let p = Path::new("/data/misc/recovery/last_log");
        assert_eq!(generation(p, 0), p);
        assert_eq!(generation(p, 3), Path::new("/data/misc/recovery/last_log.3"));
    }

    #[test]
    fn test_rotate_shifts_generations() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("last_log");
        let kmsg = dir.path().join("last_kmsg");

        fs::write(&log, b"log0").unwrap();
        fs::write(generation(&log, 1), b"log1").unwrap();
        fs::write(&kmsg, b"kmsg0").unwrap();

        let rotator = LogRotator::new(10);
        rotator.rotate(&log, &kmsg);

        assert!(rotator.has_rotated());
        assert!(!log.exists());
        assert!(!kmsg.exists());
        assert_eq!(fs::read(generation(&log, 1)).unwrap(), b"log0");
        assert_eq!(fs::read(generation(&log, 2)).unwrap(), b"log1");
        assert_eq!(fs::read(generation(&kmsg, 1)).unwrap(), b"kmsg0");
        assert!(!generation(&kmsg, 2).exists());
    }

    #[test]
    fn test_oldest_generation_dropped() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("last_log");
        let kmsg = dir.path().join("last_kmsg");

        fs::write(&log, b"0").unwrap();
        fs::write(generation(&log, 1), b"1").unwrap();
        fs::write(generation(&log, 2), b"2").unwrap();

        LogRotator::new(2).rotate(&log, &kmsg);

        assert_eq!(fs::read(generation(&log, 1)).unwrap(), b"0");
        assert_eq!(fs::read(generation(&log, 2)).unwrap(), b"1");
        assert!(!generation(&log, 3).exists());
    }

    #[test]
    fn test_rotates_once_per_instance() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("last_log");
        let kmsg = dir.path().join("last_kmsg");

        let rotator = LogRotator::new(10);
        fs::write(&log, b"first").unwrap();
        rotator.rotate(&log, &kmsg);

        fs::write(&log, b"second").unwrap();
        rotator.rotate(&log, &kmsg);

        assert_eq!(fs::read(&log).unwrap(), b"second");
        assert_eq!(fs::read(generation(&log, 1)).unwrap(), b"first");
        assert!(!generation(&log, 2).exists());
    }
}
