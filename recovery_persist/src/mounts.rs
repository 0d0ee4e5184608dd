//! 挂载表检查

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::error;

/// 挂载表中是否有 mount_point 的挂载
///
/// 挂载表打不开时记录日志并按没有挂载处理
pub fn has_mount(mounts: &Path, mount_point: &str) -> bool {
    let file = match File::open(mounts) {
        Ok(f) => f,
        Err(e) => {
            error!("failed to open {}: {}", mounts.display(), e);
            return false;
        }
    };

    let needle = format!(" {} ", mount_point);
    let reader = BufReader::new(file);
    for line in reader.split(b'\n') {
        match line {
            Ok(line) => {
                if String::from_utf8_lossy(&line).contains(&needle) {
                    return true;
                }
            }
            Err(e) => {
                error!("failed to read {}: {}", mounts.display(), e);
                break;
            }
        }
    }
    false
}
