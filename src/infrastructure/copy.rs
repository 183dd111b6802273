//! PostgreSQL `COPY ... FROM STDIN` 文本格式编码
//!
//! 字段以制表符分隔，行以换行结束，`\N` 表示 NULL；
//! 字段内的反斜杠、制表符、换行和回车需要转义。

/// 分块编码器：缓冲区达到分块大小时交出一块数据
#[derive(Debug)]
pub struct CopyTextEncoder {
    buf: Vec<u8>,
    chunk_bytes: usize,
    rows: u64,
}

impl CopyTextEncoder {
    pub fn new(chunk_bytes: usize) -> Self {
        let chunk_bytes = chunk_bytes.max(1);
        Self {
            buf: Vec::with_capacity(chunk_bytes.min(64 * 1024)),
            chunk_bytes,
            rows: 0,
        }
    }

    /// 追加一行；缓冲区满时返回待发送的数据块
    pub fn push_row(&mut self, fields: &[Option<&str>]) -> Option<Vec<u8>> {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.buf.push(b'\t');
            }
            match field {
                Some(value) => escape_into(&mut self.buf, value),
                None => self.buf.extend_from_slice(b"\\N"),
            }
        }
        self.buf.push(b'\n');
        self.rows += 1;

        if self.buf.len() >= self.chunk_bytes {
            Some(std::mem::take(&mut self.buf))
        } else {
            None
        }
    }

    /// 已编码的行数
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// 取出剩余数据
    pub fn finish(self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf)
        }
    }
}

fn escape_into(buf: &mut Vec<u8>, value: &str) {
    for &byte in value.as_bytes() {
        match byte {
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            other => buf.push(other),
        }
    }
}
