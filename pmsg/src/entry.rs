//! 日志条目结构
//!
//! pmsg 记录的条目定义和序列化/反序列化

use crate::constants::{LOGGER_MAGIC, RECORD_HEADER_SIZE};
use crate::header::RecordHeader;

/// 单条 pmsg 记录
#[derive(Debug, Clone)]
pub struct PmsgEntry {
    pub header: RecordHeader,
    /// 负载: prio(1B) + tag + '\0' + message
    pub payload: Vec<u8>,
}

impl PmsgEntry {
    /// 优先级（负载首字节）
    pub fn priority(&self) -> u8 {
        self.payload.first().copied().unwrap_or(0)
    }

    /// tag 字节（不含结尾的 '\0'），没有结尾 '\0' 时返回 None
    pub fn tag(&self) -> Option<&[u8]> {
        let body = self.payload.get(1..)?;
        let end = body.iter().position(|&b| b == 0)?;
        Some(&body[..end])
    }

    /// tag 之后的消息内容
    pub fn message(&self) -> &[u8] {
        match self.tag() {
            Some(tag) => &self.payload[1 + tag.len() + 1..],
            None => &[],
        }
    }

    /// 文件记录的文件名
    ///
    /// 文件记录的 tag 形如 `dir:base`（可打印、无空白、恰好一个 ':'），
    /// 还原为 `dir/base`。不是文件记录时返回 None。
    pub fn file_name(&self) -> Option<String> {
        let tag = self.tag()?;
        if tag.is_empty() {
            return None;
        }

        let mut split = None;
        for (i, &b) in tag.iter().enumerate() {
            if !b.is_ascii_graphic() {
                return None;
            }
            if b == b':' {
                if split.is_some() {
                    return None;
                }
                split = Some(i);
            }
        }

        let split = split?;
        let mut name = tag.to_vec();
        name[split] = b'/';
        String::from_utf8(name).ok()
    }

    /// 计算总大小（包括头）
    pub fn total_size(&self) -> usize {
        RECORD_HEADER_SIZE + self.payload.len()
    }

    /// 序列化到字节
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.total_size());
        let mut header = self.header.clone();
        header.len = self.total_size() as u16;
        // Vec 写入不会失败
        let _ = header.write_to(&mut buf);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// 从字节反序列化，返回条目和占用的字节数
    pub fn deserialize(data: &[u8]) -> Option<(Self, usize)> {
        if data.first() != Some(&LOGGER_MAGIC) {
            return None;
        }

        let header = RecordHeader::read_from(data)?;
        if !header.is_valid() {
            return None;
        }

        let total_size = header.len as usize;
        if data.len() < total_size {
            return None;
        }

        let payload = data[RECORD_HEADER_SIZE..total_size].to_vec();
        Some((Self { header, payload }, total_size))
    }
}
