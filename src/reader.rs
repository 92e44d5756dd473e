//! Tail reader
//!
//! Dual-path reads over a single log file. The fast path seeks straight to
//! an indexed line-start offset and streams the remainder verbatim; the slow
//! path makes two linear passes (count, then skip and stream) and is used
//! when the requested depth exceeds the indexed window. Neither path ever
//! mutates the index.

use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Reads tails of log files out of one directory.
pub struct TailReader {
    dir: PathBuf,
}

impl TailReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Positional read: stream everything from `offset` to end of file.
    ///
    /// Trusts the caller to have located a line boundary via the index; no
    /// line counting happens here.
    pub async fn read_fast<W>(
        &self,
        filename: &str,
        offset: u64,
        sink: &mut W,
    ) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut file = File::open(self.dir.join(filename)).await?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }
        let mut reader = BufReader::new(file);
        tokio::io::copy_buf(&mut reader, sink).await?;
        sink.flush().await?;
        Ok(())
    }

    /// Linear read for depths beyond the indexed window: count every line,
    /// then re-read, skip `total - n`, and stream the tail with `\n`
    /// terminators. Cost is proportional to the file size.
    pub async fn read_slow<W>(&self, filename: &str, n: u64, sink: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let path = self.dir.join(filename);

        let mut total: u64 = 0;
        {
            let file = File::open(&path).await?;
            let mut lines = BufReader::new(file).lines();
            while lines.next_line().await?.is_some() {
                total += 1;
            }
        }

        let file = File::open(&path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut skip = total.saturating_sub(n);
        while let Some(line) = lines.next_line().await? {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            sink.write_all(line.as_bytes()).await?;
            sink.write_all(b"\n").await?;
        }
        sink.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn read_fast_streams_from_the_given_offset() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "one\ntwo\nthree\n").unwrap();
        let reader = TailReader::new(dir.path());

        let mut sink = Vec::new();
        reader.read_fast("a.log", 4, &mut sink).await.unwrap();

        assert_eq!(sink, b"two\nthree\n");
    }

    #[tokio::test]
    async fn read_fast_from_zero_streams_the_whole_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "one\ntwo\n").unwrap();
        let reader = TailReader::new(dir.path());

        let mut sink = Vec::new();
        reader.read_fast("a.log", 0, &mut sink).await.unwrap();

        assert_eq!(sink, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn read_fast_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let reader = TailReader::new(dir.path());

        let mut sink = Vec::new();
        let err = reader.read_fast("nope.log", 0, &mut sink).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn read_slow_returns_the_last_n_lines() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "one\ntwo\nthree\nfour\n").unwrap();
        let reader = TailReader::new(dir.path());

        let mut sink = Vec::new();
        reader.read_slow("a.log", 2, &mut sink).await.unwrap();

        assert_eq!(sink, b"three\nfour\n");
    }

    #[tokio::test]
    async fn read_slow_with_n_at_least_total_returns_everything() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "one\ntwo\nthree\n").unwrap();
        let reader = TailReader::new(dir.path());

        let mut sink = Vec::new();
        reader.read_slow("a.log", 50, &mut sink).await.unwrap();

        assert_eq!(sink, b"one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn read_slow_normalizes_the_final_terminator() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "one\ntwo").unwrap();
        let reader = TailReader::new(dir.path());

        let mut sink = Vec::new();
        reader.read_slow("a.log", 10, &mut sink).await.unwrap();

        assert_eq!(sink, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn read_slow_zero_lines_is_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "one\ntwo\n").unwrap();
        let reader = TailReader::new(dir.path());

        let mut sink = Vec::new();
        reader.read_slow("a.log", 0, &mut sink).await.unwrap();

        assert!(sink.is_empty());
    }
}
