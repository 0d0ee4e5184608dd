//! 运行编排
//!
//! 按顺序经过几道关卡，任一关卡可以提前结束本次运行：
//!
//! ```text
//! CacheCheck -> PmsgCheck -> Drain -> Cleanup -> Reconcile
//! ```
//!
//! - CacheCheck: 有 /cache 挂载的设备走旧的 cache 日志流程，清理 last_install 后退出（--force-persist 除外）
//! - PmsgCheck:  pstore 中没有 pmsg 数据则退出
//! - Drain:      把 pmsg 中的文件逐个交给 PmsgSink
//! - Cleanup:    无 cache 设备上删除 /data 下的 last_install
//! - Reconcile:  与控制台快照对账

use pmsg::{PmsgFile, PmsgLog};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::PersistConfig;
use crate::mounts::has_mount;
use crate::reconcile::{reconcile_console, ReconcileOutcome};
use crate::rotate::Rotate;
use crate::sink::{DrainOutcome, PmsgSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    CacheCheck,
    PmsgCheck,
    Drain,
    Cleanup,
    Reconcile,
}

/// 运行结束的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// 有 cache 挂载且没有 --force-persist
    CacheMounted,
    /// 没有 pmsg 数据
    NoPmsg,
    Completed,
}

/// 关卡判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Exit(ExitReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exit: ExitReason,
    /// 最后经过的关卡
    pub last_gate: Gate,
    pub has_cache: bool,
    pub drain: DrainOutcome,
    /// pmsg 中跳过的损坏位置数
    pub corrupted: usize,
    pub reconcile: Option<ReconcileOutcome>,
}

/// 删除遗留文件，失败只记录日志
fn remove_legacy(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => error!("Failed to unlink {}: {}", path.display(), e),
    }
}

pub struct Persist<'a> {
    config: &'a PersistConfig,
    rotator: &'a dyn Rotate,
    force: bool,
    gate: Gate,
    has_cache: bool,
    drain: DrainOutcome,
    corrupted: usize,
    reconcile: Option<ReconcileOutcome>,
}

impl<'a> Persist<'a> {
    pub fn new(config: &'a PersistConfig, rotator: &'a dyn Rotate, force: bool) -> Self {
        Self {
            config,
            rotator,
            force,
            gate: Gate::CacheCheck,
            has_cache: false,
            drain: DrainOutcome::default(),
            corrupted: 0,
            reconcile: None,
        }
    }

    /// 当前所在的关卡
    pub fn gate(&self) -> Gate {
        self.gate
    }

    /// 关卡 1: cache 挂载检查
    pub fn check_cache(&mut self) -> Verdict {
        self.gate = Gate::CacheCheck;
        self.has_cache = has_mount(&self.config.mounts, &self.config.cache_mount_point);
        if !self.has_cache {
            return Verdict::Continue;
        }

        info!("{} is mounted", self.config.cache_mount_point);
        remove_legacy(&self.config.last_install_in_cache);

        if self.force {
            info!("--force-persist given, persisting pmsg anyway");
            Verdict::Continue
        } else {
            Verdict::Exit(ExitReason::CacheMounted)
        }
    }

    /// 关卡 2: pmsg 数据是否存在
    pub fn check_pmsg(&mut self) -> Verdict {
        self.gate = Gate::PmsgCheck;
        if self.config.pmsg_source.exists() {
            Verdict::Continue
        } else {
            debug!("{} not found", self.config.pmsg_source.display());
            Verdict::Exit(ExitReason::NoPmsg)
        }
    }

    /// 读取 pmsg 并排空
    pub fn drain(&mut self) {
        self.gate = Gate::Drain;
        let log = match PmsgLog::open(&self.config.pmsg_source) {
            Ok(log) => log,
            Err(e) => {
                error!("Failed to read {}: {}", self.config.pmsg_source.display(), e);
                return;
            }
        };

        self.corrupted = log.corrupted();
        if self.corrupted > 0 {
            warn!(
                "{}: skipped {} corrupted positions",
                self.config.pmsg_source.display(),
                self.corrupted
            );
        }

        let files = log.into_files(&self.config.file_filter());
        self.drain_files(files);
    }

    /// 排空给定的文件序列
    pub fn drain_files<I: IntoIterator<Item = PmsgFile>>(&mut self, files: I) {
        let mut sink = PmsgSink::new(self.config, self.rotator);
        sink.drain(files);
        self.drain = sink.finish();

        let stats = &self.drain.stats;
        info!(
            "Drained {} files: {} written, {} unchanged, {} failed",
            stats.records, stats.written, stats.unchanged, stats.failed
        );
    }

    /// 无 cache 设备上 last_install 已经从 pmsg 复制过来，只保留 sideload 历史
    pub fn cleanup(&mut self) {
        self.gate = Gate::Cleanup;
        if !self.has_cache {
            remove_legacy(&self.config.last_install);
        }
    }

    pub fn reconcile(&mut self) -> &ReconcileOutcome {
        self.gate = Gate::Reconcile;
        let outcome = reconcile_console(
            self.drain.rotated,
            &self.config.last_log,
            &self.config.last_kmsg,
            &self.config.console_sources,
            self.rotator,
        );
        self.reconcile.insert(outcome)
    }

    fn report(self, exit: ExitReason) -> RunReport {
        RunReport {
            exit,
            last_gate: self.gate,
            has_cache: self.has_cache,
            drain: self.drain,
            corrupted: self.corrupted,
            reconcile: self.reconcile,
        }
    }

    /// 依次执行所有关卡
    pub fn run(mut self) -> RunReport {
        if let Verdict::Exit(reason) = self.check_cache() {
            return self.report(reason);
        }
        if let Verdict::Exit(reason) = self.check_pmsg() {
            return self.report(reason);
        }

        self.drain();
        self.cleanup();
        self.reconcile();

        self.report(ExitReason::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotate::LogRotator;
    use pmsg::{priority, LogId, PmsgWriter};
    use tempfile::tempdir;

    #[test]
    fn test_cache_gate() {
        let dir = tempdir().unwrap();
        let config = PersistConfig::rooted_at(dir.path());
        fs::create_dir_all(config.mounts.parent().unwrap()).unwrap();
        fs::write(&config.mounts, "/dev/block/cache /cache ext4 rw 0 0\n").unwrap();

        let rotator = LogRotator::new(config.keep_log_count);
        let mut persist = Persist::new(&config, &rotator, false);
        assert_eq!(persist.check_cache(), Verdict::Exit(ExitReason::CacheMounted));

        let mut forced = Persist::new(&config, &rotator, true);
        assert_eq!(forced.check_cache(), Verdict::Continue);
    }

    #[test]
    fn test_pmsg_gate() {
        let dir = tempdir().unwrap();
        let config = PersistConfig::rooted_at(dir.path());
        let rotator = LogRotator::new(config.keep_log_count);
        let mut persist = Persist::new(&config, &rotator, false);

        assert_eq!(persist.check_pmsg(), Verdict::Exit(ExitReason::NoPmsg));
        assert_eq!(persist.gate(), Gate::PmsgCheck);

        fs::create_dir_all(config.pmsg_source.parent().unwrap()).unwrap();
        fs::write(&config.pmsg_source, b"").unwrap();
        assert_eq!(persist.check_pmsg(), Verdict::Continue);
    }

    #[test]
    fn test_cleanup_only_without_cache() {
        let dir = tempdir().unwrap();
        let config = PersistConfig::rooted_at(dir.path());
        fs::create_dir_all(config.last_install.parent().unwrap()).unwrap();
        fs::write(&config.last_install, b"sideload").unwrap();

        let rotator = LogRotator::new(config.keep_log_count);
        let mut persist = Persist::new(&config, &rotator, true);
        persist.has_cache = true;
        persist.cleanup();
        assert!(config.last_install.exists());

        persist.has_cache = false;
        persist.cleanup();
        assert!(!config.last_install.exists());

        // 再次清理不存在的文件不报错
        persist.cleanup();
    }

    #[test]
    fn test_unreadable_pmsg_is_not_fatal() {
        let dir = tempdir().unwrap();
        let config = PersistConfig::rooted_at(dir.path());
        // pmsg 路径是目录：存在但读取失败
        fs::create_dir_all(&config.pmsg_source).unwrap();

        let rotator = LogRotator::new(config.keep_log_count);
        let report = Persist::new(&config, &rotator, false).run();

        assert_eq!(report.exit, ExitReason::Completed);
        assert_eq!(report.last_gate, Gate::Reconcile);
        assert_eq!(report.drain, DrainOutcome::default());
        assert_eq!(report.reconcile, Some(ReconcileOutcome::NotRotated));
    }

    #[test]
    fn test_gate_follows_stages() {
        let dir = tempdir().unwrap();
        let config = PersistConfig::rooted_at(dir.path());
        let rotator = LogRotator::new(config.keep_log_count);
        let mut persist = Persist::new(&config, &rotator, false);

        assert_eq!(persist.gate(), Gate::CacheCheck);

        // pmsg 不存在：读取失败只记录日志
        persist.drain();
        assert_eq!(persist.gate(), Gate::Drain);
        persist.cleanup();
        assert_eq!(persist.gate(), Gate::Cleanup);
        persist.reconcile();
        assert_eq!(persist.gate(), Gate::Reconcile);
    }

    #[test]
    fn test_failed_cleanup_does_not_stop_run() {
        let dir = tempdir().unwrap();
        let config = PersistConfig::rooted_at(dir.path());

        // last_install 是非空目录，remove_file 失败
        fs::create_dir_all(&config.last_install).unwrap();
        fs::write(config.last_install.join("keep"), b"x").unwrap();

        let mut writer = PmsgWriter::with_time(Vec::new(), 1);
        writer
            .write_file(LogId::SYSTEM, priority::INFO, "recovery/last_log", b"from pmsg")
            .unwrap();
        fs::create_dir_all(config.pmsg_source.parent().unwrap()).unwrap();
        fs::write(&config.pmsg_source, writer.into_inner()).unwrap();

        let rotator = LogRotator::new(config.keep_log_count);
        let report = Persist::new(&config, &rotator, false).run();

        assert_eq!(report.exit, ExitReason::Completed);
        assert_eq!(report.last_gate, Gate::Reconcile);
        assert_eq!(report.drain.stats.written, 1);
        assert_eq!(fs::read(&config.last_log).unwrap(), b"from pmsg");
        assert!(config.last_install.is_dir());
    }
}
