//! 文件比较
//!
//! 逐块比较两个文件，控制台快照大小不定，不整体读入内存

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::error;

/// 比较块大小
const COMPARE_BLOCK_SIZE: usize = 16 * 1024;

/// 文件可读时返回其大小
fn readable_size(path: &Path) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    meta.is_file().then(|| meta.len())
}

/// 两个文件内容逐字节相同时返回 true
///
/// 任一文件不存在、大小不同、读取失败都返回 false（读取失败会记录日志）
pub fn files_equal(a: &Path, b: &Path) -> bool {
    let (Some(size_a), Some(size_b)) = (readable_size(a), readable_size(b)) else {
        return false;
    };
    if size_a != size_b {
        return false;
    }

    let mut file_a = match File::open(a) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to open {}: {}", a.display(), e);
            return false;
        }
    };
    let mut file_b = match File::open(b) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to open {}: {}", b.display(), e);
            return false;
        }
    };

    let mut buf_a = vec![0u8; COMPARE_BLOCK_SIZE];
    let mut buf_b = vec![0u8; COMPARE_BLOCK_SIZE];
    let mut remain = size_a;

    while remain > 0 {
        let n = remain.min(COMPARE_BLOCK_SIZE as u64) as usize;

        if let Err(e) = file_a.read_exact(&mut buf_a[..n]) {
            error!("Failed to read from {}: {}", a.display(), e);
            return false;
        }
        if let Err(e) = file_b.read_exact(&mut buf_b[..n]) {
            error!("Failed to read from {}: {}", b.display(), e);
            return false;
        }
        if buf_a[..n] != buf_b[..n] {
            return false;
        }

        remain -= n as u64;
    }

    true
}
