//! 控制台日志对账
//!
//! 只在本次已经轮转过时执行：last_kmsg 与控制台快照都不一致时再请求一次轮转，
//! 然后把优先的控制台快照复制到 last_kmsg

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::compare::files_equal;
use crate::copy::copy_file;
use crate::rotate::Rotate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// 本次没有轮转，last_kmsg 无需处理
    NotRotated,
    /// 没有控制台快照
    NoConsole,
    /// 已复制控制台快照；rerotated 表示因内容不一致又请求了一次轮转
    Copied { source: PathBuf, rerotated: bool },
}

/// 第一个存在的控制台快照
fn first_existing(sources: &[PathBuf]) -> Option<&Path> {
    sources.iter().map(PathBuf::as_path).find(|p| p.exists())
}

pub fn reconcile_console(
    rotated: bool,
    last_log: &Path,
    last_kmsg: &Path,
    console_sources: &[PathBuf],
    rotator: &dyn Rotate,
) -> ReconcileOutcome {
    if !rotated {
        return ReconcileOutcome::NotRotated;
    }

    let Some(source) = first_existing(console_sources) else {
        debug!("No console snapshot found");
        return ReconcileOutcome::NoConsole;
    };

    let matches = console_sources
        .iter()
        .any(|console| files_equal(last_kmsg, console));

    if !matches {
        info!(
            "{} differs from console snapshot, rotating",
            last_kmsg.display()
        );
        rotator.rotate(last_log, last_kmsg);
    }

    info!("Copying {} -> {}", source.display(), last_kmsg.display());
    copy_file(source, last_kmsg);

    ReconcileOutcome::Copied {
        source: source.to_path_buf(),
        rerotated: !matches,
    }
}
