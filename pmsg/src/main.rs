//! pmsg 命令行工具
//!
//! 用法：
//!   pmsg stats [input]                                      # 显示统计
//!   pmsg files [input] [--prefix recovery/] [--out-dir DIR] # 列出/导出重组后的文件

use clap::{Parser, Subcommand};
use pmsg::{priority, FileFilter, LogId, PmsgLog, DEFAULT_PMSG_PATH};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Parser)]
#[command(name = "pmsg")]
#[command(about = "Inspect pstore pmsg ring-buffer dumps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示统计信息
    Stats {
        /// 输入文件路径
        #[arg(default_value = DEFAULT_PMSG_PATH)]
        input: String,
    },

    /// 列出重组后的文件，可选导出到目录
    Files {
        /// 输入文件路径
        #[arg(default_value = DEFAULT_PMSG_PATH)]
        input: String,

        /// 文件名前缀
        #[arg(short, long, default_value = "recovery/")]
        prefix: String,

        /// 日志缓冲区编号（默认 system）
        #[arg(short, long, default_value_t = LogId::SYSTEM.0)]
        log_id: u8,

        /// 导出目录（会自动创建）
        #[arg(short = 'D', long = "out-dir")]
        out_dir: Option<String>,
    },
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input } => cmd_stats(&input),
        Commands::Files {
            input,
            prefix,
            log_id,
            out_dir,
        } => cmd_files(&input, prefix, LogId(log_id), out_dir.as_deref()),
    }
}

fn open(input: &str) -> io::Result<PmsgLog> {
    PmsgLog::open(input).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// 显示统计信息
fn cmd_stats(input: &str) -> io::Result<()> {
    let log = open(input)?;
    print!("{}", log.stats());
    Ok(())
}

/// 列出/导出文件
fn cmd_files(input: &str, prefix: String, log_id: LogId, out_dir: Option<&str>) -> io::Result<()> {
    let log = open(input)?;
    if log.corrupted() > 0 {
        eprintln!("pmsg: skipped {} corrupted positions", log.corrupted());
    }

    let filter = FileFilter {
        log_id,
        min_priority: priority::VERBOSE,
        prefix,
    };

    let mut count = 0;
    for file in log.into_files(&filter) {
        println!(
            "  {:<32} {} prio={} {} bytes",
            file.name,
            file.log_id,
            file.priority,
            file.content.len()
        );

        if let Some(dir) = out_dir {
            let path = Path::new(dir).join(&file.name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &file.content)?;
            println!("    -> {}", path.display());
        }
        count += 1;
    }

    println!("共 {} 个文件", count);
    Ok(())
}
