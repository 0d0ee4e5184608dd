//! 记录头结构
//!
//! pmsg 记录头定义：pmsg 头 (7 字节) 紧跟日志头 (11 字节)，均为小端紧凑布局

use std::io::{self, Write};

use crate::constants::{
    LogId, LOGGER_ENTRY_MAX_LEN, LOGGER_MAGIC, PMSG_FILE_MAX_SEQUENCE, PMSG_FILE_SEQUENCE,
    RECORD_HEADER_SIZE,
};

/// 记录头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub magic: u8,
    pub len: u16, // 记录总长度（包括头）
    pub uid: u16,
    pub pid: u16,
    pub log_id: LogId,
    pub tid: u16,
    pub sec: u32,  // realtime 秒
    pub nsec: u32, // 文件记录中用作分片序列号
}

impl RecordHeader {
    pub fn new(log_id: LogId, payload_len: usize, sec: u32, nsec: u32) -> Self {
        Self {
            magic: LOGGER_MAGIC,
            len: (RECORD_HEADER_SIZE + payload_len) as u16,
            uid: 0,
            pid: 0,
            log_id,
            tid: 0,
            sec,
            nsec,
        }
    }

    /// 从字节解析，数据不足时返回 None
    pub fn read_from(buf: &[u8]) -> Option<Self> {
        if buf.len() < RECORD_HEADER_SIZE {
            return None;
        }

        Some(Self {
            magic: buf[0],
            len: u16::from_le_bytes([buf[1], buf[2]]),
            uid: u16::from_le_bytes([buf[3], buf[4]]),
            pid: u16::from_le_bytes([buf[5], buf[6]]),
            log_id: LogId(buf[7]),
            tid: u16::from_le_bytes([buf[8], buf[9]]),
            sec: u32::from_le_bytes([buf[10], buf[11], buf[12], buf[13]]),
            nsec: u32::from_le_bytes([buf[14], buf[15], buf[16], buf[17]]),
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; RECORD_HEADER_SIZE];
        buf[0] = self.magic;
        buf[1..3].copy_from_slice(&self.len.to_le_bytes());
        buf[3..5].copy_from_slice(&self.uid.to_le_bytes());
        buf[5..7].copy_from_slice(&self.pid.to_le_bytes());
        buf[7] = self.log_id.0;
        buf[8..10].copy_from_slice(&self.tid.to_le_bytes());
        buf[10..14].copy_from_slice(&self.sec.to_le_bytes());
        buf[14..18].copy_from_slice(&self.nsec.to_le_bytes());
        writer.write_all(&buf)
    }

    /// 魔数和长度是否合理
    pub fn is_valid(&self) -> bool {
        let len = self.len as usize;
        self.magic == LOGGER_MAGIC && len > RECORD_HEADER_SIZE && len <= LOGGER_ENTRY_MAX_LEN
    }

    pub fn payload_len(&self) -> usize {
        (self.len as usize).saturating_sub(RECORD_HEADER_SIZE)
    }

    /// 文件分片序列号，nsec 不是合法序列时返回 None
    pub fn file_sequence(&self) -> Option<u32> {
        if self.nsec % PMSG_FILE_SEQUENCE != 0 {
            return None;
        }
        let seq = self.nsec / PMSG_FILE_SEQUENCE;
        (seq < PMSG_FILE_MAX_SEQUENCE).then_some(seq)
    }
}
