//! 持久化配置
//!
//! 所有路径默认是设备上的固定位置；bring-up 或测试时可以从 JSON 文件覆盖部分字段

use pmsg::{priority, FileFilter, LogId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 指向 JSON 配置文件的环境变量
pub const CONFIG_ENV: &str = "RECOVERY_PERSIST_CONFIG";

pub const LAST_LOG_FILE: &str = "/data/misc/recovery/last_log";
pub const LAST_PMSG_FILE: &str = "/sys/fs/pstore/pmsg-ramoops-0";
pub const LAST_KMSG_FILE: &str = "/data/misc/recovery/last_kmsg";
pub const LAST_CONSOLE_FILE: &str = "/sys/fs/pstore/console-ramoops-0";
pub const ALT_LAST_CONSOLE_FILE: &str = "/sys/fs/pstore/console-ramoops";
pub const LAST_INSTALL_FILE: &str = "/data/misc/recovery/last_install";
pub const LAST_INSTALL_FILE_IN_CACHE: &str = "/cache/recovery/last_install";

/// 轮转保留的历史份数
pub const KEEP_LOG_COUNT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// pmsg 文件名拼接的根目录
    pub log_root: PathBuf,
    pub last_log: PathBuf,
    pub last_kmsg: PathBuf,
    pub pmsg_source: PathBuf,
    /// 控制台快照候选，按优先级排列
    pub console_sources: Vec<PathBuf>,
    pub mounts: PathBuf,
    pub cache_mount_point: String,
    pub last_install_in_cache: PathBuf,
    pub last_install: PathBuf,
    pub keep_log_count: usize,
    pub log_id: u8,
    pub min_priority: u8,
    pub prefix: String,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            log_root: PathBuf::from("/data/misc/"),
            last_log: PathBuf::from(LAST_LOG_FILE),
            last_kmsg: PathBuf::from(LAST_KMSG_FILE),
            pmsg_source: PathBuf::from(LAST_PMSG_FILE),
            console_sources: vec![
                PathBuf::from(LAST_CONSOLE_FILE),
                PathBuf::from(ALT_LAST_CONSOLE_FILE),
            ],
            mounts: PathBuf::from("/proc/mounts"),
            cache_mount_point: "/cache".to_string(),
            last_install_in_cache: PathBuf::from(LAST_INSTALL_FILE_IN_CACHE),
            last_install: PathBuf::from(LAST_INSTALL_FILE),
            keep_log_count: KEEP_LOG_COUNT,
            log_id: LogId::SYSTEM.0,
            min_priority: priority::INFO,
            prefix: "recovery/".to_string(),
        }
    }
}

impl PersistConfig {
    /// 从 JSON 文件加载配置，未出现的字段取默认值
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: PersistConfig = serde_json::from_str(&content)?;

        if config.console_sources.is_empty() {
            anyhow::bail!("console_sources must not be empty");
        }

        Ok(config)
    }

    /// 保存配置到 JSON 文件
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 环境变量指定了配置文件时加载它，否则使用默认配置
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// 所有路径放到同一个根目录下（测试用的目录树）
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        fn reroot(root: &Path, p: &Path) -> PathBuf {
            root.join(p.strip_prefix("/").unwrap_or(p))
        }

        let root = root.as_ref();
        let mut config = Self::default();

        config.log_root = reroot(root, &config.log_root);
        config.last_log = reroot(root, &config.last_log);
        config.last_kmsg = reroot(root, &config.last_kmsg);
        config.pmsg_source = reroot(root, &config.pmsg_source);
        config.console_sources = config
            .console_sources
            .iter()
            .map(|p| reroot(root, p))
            .collect();
        config.mounts = reroot(root, &config.mounts);
        config.last_install_in_cache = reroot(root, &config.last_install_in_cache);
        config.last_install = reroot(root, &config.last_install);
        config
    }

    pub fn file_filter(&self) -> FileFilter {
        FileFilter {
            log_id: LogId(self.log_id),
            min_priority: self.min_priority,
            prefix: self.prefix.clone(),
        }
    }
}
