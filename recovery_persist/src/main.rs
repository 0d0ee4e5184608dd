//! recovery-persist
//!
//! 用法: recovery-persist [--force-persist]
//!
//! 没有 /cache 挂载的设备上，把 pmsg 中 LOG_ID_SYSTEM、INFO 及以上优先级、
//! recovery/ 下的文件转存到 /data/misc/recovery/，按需轮转。
//!
//!   --force-persist  忽略 /cache 挂载，总是转存

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use recovery_persist::{LogRotator, Persist, PersistConfig};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "recovery-persist")]
#[command(about = "Persist recovery logs from pmsg into /data/misc/recovery after boot")]
struct Cli {
    /// 忽略 /cache 挂载，总是转存 pmsg 数据
    #[arg(long = "force-persist")]
    force_persist: bool,
}

/// 参数解析失败不能影响转存：记录日志，只看第一个参数是否为 --force-persist
fn parse_cli() -> Result<Cli> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            std::process::exit(0);
        }
        Err(e) => {
            error!("Ignoring bad arguments: {}", e.render().to_string().trim_end());
            Ok(Cli {
                force_persist: std::env::args().nth(1).as_deref() == Some("--force-persist"),
            })
        }
    }
}

fn main() -> Result<()> {
    // 设置日志，RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = parse_cli()?;

    let config = PersistConfig::from_env().unwrap_or_else(|e| {
        error!("Bad configuration, using defaults: {:#}", e);
        PersistConfig::default()
    });
    let rotator = LogRotator::new(config.keep_log_count);

    let report = Persist::new(&config, &rotator, cli.force_persist).run();
    info!(
        "recovery-persist: {:?} at {:?}, rotated: {}",
        report.exit, report.last_gate, report.drain.rotated
    );

    // 运行结果只记录日志，退出码总是 0
    Ok(())
}
