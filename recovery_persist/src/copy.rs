//! 文件复制
//!
//! 尽力而为：所有错误只记录日志，不向调用方返回

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, error};

const COPY_BLOCK_SIZE: usize = 4096;

/// 复制 source 到 destination
///
/// 先打开目标；目标打不开则直接返回，不会碰源文件。
/// 源打不开时目标仍会被创建（长度为 0）。
pub fn copy_file(source: &Path, destination: &Path) {
    let dest = match File::create(destination) {
        Ok(f) => f,
        Err(e) => {
            error!("Can't open {}: {}", destination.display(), e);
            return;
        }
    };
    let mut dest = BufWriter::new(dest);

    match File::open(source) {
        Ok(mut src) => match copy_blocks(&mut src, &mut dest) {
            Ok(n) => debug!(
                "Copied {} bytes {} -> {}",
                n,
                source.display(),
                destination.display()
            ),
            Err(CopyError::Read(e)) => error!("Error in {}: {}", source.display(), e),
            Err(CopyError::Write(e)) => error!("Error in {}: {}", destination.display(), e),
        },
        Err(e) => error!("Can't open {}: {}", source.display(), e),
    }

    // 关闭前刷新并检查错误
    if let Err(e) = dest.flush() {
        error!("Error in {}: {}", destination.display(), e);
    }
}

enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

fn copy_blocks<R: Read, W: Write>(src: &mut R, dest: &mut W) -> Result<u64, CopyError> {
    let mut buf = [0u8; COPY_BLOCK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        dest.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
}
