//! 写入器模块
//!
//! 把文件编码为 pmsg 记录流，格式与设备上写入 /dev/pmsg0 的一致

use std::io::Write;

use crate::constants::{
    LogId, LOGGER_ENTRY_MAX_PAYLOAD, PMSG_FILE_MAX_SEQUENCE, PMSG_FILE_SEQUENCE,
};
use crate::entry::PmsgEntry;
use crate::error::PmsgError;
use crate::header::RecordHeader;

/// pmsg 记录写入器
pub struct PmsgWriter<W: Write> {
    inner: W,
    /// 所有记录共用的 realtime 秒
    sec: u32,
    pid: u16,
    uid: u16,
}

impl<W: Write> PmsgWriter<W> {
    pub fn new(inner: W) -> Self {
        let sec = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self {
            inner,
            sec,
            pid: std::process::id() as u16,
            uid: 0,
        }
    }

    /// 固定时间、pid 为 0，输出可复现（用于构造测试数据）
    pub fn with_time(inner: W, sec: u32) -> Self {
        Self {
            inner,
            sec,
            pid: 0,
            uid: 0,
        }
    }

    /// 写入一条普通日志（非文件记录）
    pub fn write_log(
        &mut self,
        log_id: LogId,
        prio: u8,
        tag: &str,
        message: &[u8],
    ) -> Result<usize, PmsgError> {
        // prio + tag + '\0' 必须放得进一条记录
        if tag.len() + 2 > LOGGER_ENTRY_MAX_PAYLOAD {
            return Err(PmsgError::InvalidFilename(tag.to_string()));
        }
        let max = LOGGER_ENTRY_MAX_PAYLOAD - (tag.len() + 2);
        let message = &message[..message.len().min(max)];
        self.write_record(log_id, prio, tag.as_bytes(), message, 0)
    }

    /// 写入一个文件，按最大负载分片
    ///
    /// 返回写入的内容字节数
    pub fn write_file(
        &mut self,
        log_id: LogId,
        prio: u8,
        name: &str,
        content: &[u8],
    ) -> Result<usize, PmsgError> {
        let tag = file_tag(name)?;
        let chunk_size = LOGGER_ENTRY_MAX_PAYLOAD.saturating_sub(tag.len() + 2);
        if chunk_size == 0 {
            return Err(PmsgError::InvalidFilename(name.to_string()));
        }

        let chunks = content.len().div_ceil(chunk_size).max(1);
        if chunks > PMSG_FILE_MAX_SEQUENCE as usize {
            return Err(PmsgError::ContentTooLarge {
                len: content.len(),
                chunks,
                max: PMSG_FILE_MAX_SEQUENCE as usize,
            });
        }

        if content.is_empty() {
            // 空文件也要留一条记录，读取端才能看到它
            self.write_record(log_id, prio, tag.as_bytes(), &[], 0)?;
            return Ok(0);
        }

        for (seq, chunk) in content.chunks(chunk_size).enumerate() {
            let nsec = seq as u32 * PMSG_FILE_SEQUENCE;
            self.write_record(log_id, prio, tag.as_bytes(), chunk, nsec)?;
        }
        Ok(content.len())
    }

    fn write_record(
        &mut self,
        log_id: LogId,
        prio: u8,
        tag: &[u8],
        message: &[u8],
        nsec: u32,
    ) -> Result<usize, PmsgError> {
        let mut payload = Vec::with_capacity(1 + tag.len() + 1 + message.len());
        payload.push(prio);
        payload.extend_from_slice(tag);
        payload.push(0);
        payload.extend_from_slice(message);

        let mut header = RecordHeader::new(log_id, payload.len(), self.sec, nsec);
        header.pid = self.pid;
        header.uid = self.uid;
        header.tid = self.pid;

        let entry = PmsgEntry { header, payload };
        self.inner.write_all(&entry.serialize())?;
        Ok(message.len())
    }

    pub fn flush(&mut self) -> Result<(), PmsgError> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// 文件名转 tag: 最后一个 '/' 换成 ':'，只保留最后一级目录
///
/// "recovery/last_log" -> "recovery:last_log"
fn file_tag(name: &str) -> Result<String, PmsgError> {
    let invalid = || PmsgError::InvalidFilename(name.to_string());

    if name.contains(':') || !name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(invalid());
    }
    let (dir, base) = name.rsplit_once('/').ok_or_else(invalid)?;
    if base.is_empty() {
        return Err(invalid());
    }
    let dir = dir.rsplit('/').next().unwrap_or(dir);
    if dir.is_empty() {
        return Err(invalid());
    }
    Ok(format!("{}:{}", dir, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_tag() {
        assert_eq!(file_tag("recovery/last_log").unwrap(), "recovery:last_log");
        assert_eq!(file_tag("misc/recovery/last_log").unwrap(), "recovery:last_log");
        assert!(file_tag("last_log").is_err());
        assert!(file_tag("recovery/").is_err());
        assert!(file_tag("/last_log").is_err());
        assert!(file_tag("recovery/last log").is_err());
        assert!(file_tag("recovery:x/last_log").is_err());
    }

    #[test]
    fn test_oversized_tag_rejected() {
        let mut writer = PmsgWriter::with_time(Vec::new(), 0);
        let tag = "t".repeat(LOGGER_ENTRY_MAX_PAYLOAD);
        let err = writer
            .write_log(LogId::MAIN, 4, &tag, b"message")
            .unwrap_err();
        assert!(matches!(err, PmsgError::InvalidFilename(_)));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_long_message_truncated() {
        let mut writer = PmsgWriter::with_time(Vec::new(), 0);
        let message = vec![b'm'; LOGGER_ENTRY_MAX_PAYLOAD * 2];
        let written = writer.write_log(LogId::MAIN, 4, "tag", &message).unwrap();
        assert_eq!(written, LOGGER_ENTRY_MAX_PAYLOAD - 5);

        let data = writer.into_inner();
        let (entry, used) = PmsgEntry::deserialize(&data).unwrap();
        assert_eq!(used, data.len());
        assert_eq!(entry.message().len(), written);
    }

    #[test]
    fn test_content_too_large() {
        let mut writer = PmsgWriter::with_time(Vec::new(), 0);
        let content = vec![b'x'; LOGGER_ENTRY_MAX_PAYLOAD * PMSG_FILE_MAX_SEQUENCE as usize];
        let err = writer
            .write_file(LogId::SYSTEM, 4, "recovery/last_log", &content)
            .unwrap_err();
        assert!(matches!(err, PmsgError::ContentTooLarge { .. }));
        assert!(writer.into_inner().is_empty());
    }
}
