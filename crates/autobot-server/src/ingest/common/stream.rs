//! Bounded byte pipe between a producer thread and a blocking reader
//!
//! Remote transfers and archive extraction run on their own threads and
//! write into a [`ChunkWriter`]; the consumer reads the bytes back through a
//! [`ChannelReader`]. At most `capacity` chunks are in flight, so a slow
//! consumer throttles the producer and a file is never held in memory whole.

use std::io::{self, Read, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// Chunks buffered between producer and consumer
pub const DEFAULT_PIPE_CAPACITY: usize = 16;

type Chunk = io::Result<Vec<u8>>;

/// Create a connected writer/reader pair
pub fn pipe(capacity: usize) -> (ChunkWriter, ChannelReader) {
    let (tx, rx) = sync_channel(capacity.max(1));
    (
        ChunkWriter { tx },
        ChannelReader {
            rx,
            current: Vec::new(),
            pos: 0,
            done: false,
        },
    )
}

/// Producer half; dropping it ends the stream
pub struct ChunkWriter {
    tx: SyncSender<Chunk>,
}

impl ChunkWriter {
    /// Hand a producer-side failure to the reader instead of a clean EOF
    pub fn fail(self, err: io::Error) {
        let _ = self.tx.send(Err(err));
    }
}

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(Ok(buf.to_vec()))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "stream reader dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Consumer half, a plain blocking [`Read`]
pub struct ChannelReader {
    rx: Receiver<Chunk>,
    current: Vec<u8>,
    pos: usize,
    done: bool,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.current.len() {
            if self.done {
                return Ok(0);
            }
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.current = chunk;
                    self.pos = 0;
                },
                Ok(Err(e)) => {
                    self.done = true;
                    return Err(e);
                },
                Err(_) => {
                    self.done = true;
                    return Ok(0);
                },
            }
        }

        let n = buf.len().min(self.current.len() - self.pos);
        buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Run `produce` on a named thread writing into a fresh pipe
///
/// An error returned by `produce` reaches the reader as a read error.
pub fn spawn_producer<F>(name: &str, capacity: usize, produce: F) -> io::Result<ChannelReader>
where
    F: FnOnce(&mut ChunkWriter) -> io::Result<()> + Send + 'static,
{
    let (mut writer, reader) = pipe(capacity);
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            if let Err(e) = produce(&mut writer) {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    tracing::debug!("Stream consumer went away before the end of the transfer");
                } else {
                    tracing::warn!(error = %e, "Stream producer failed");
                    writer.fail(e);
                }
            }
        })?;
    Ok(reader)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_delivers_bytes_in_order() {
        let reader = spawn_producer("test-producer", 2, |w| {
            for i in 0..100u32 {
                w.write_all(format!("line {}\n", i).as_bytes())?;
            }
            Ok(())
        })
        .unwrap();

        let mut out = String::new();
        let mut reader = reader;
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out.lines().count(), 100);
        assert!(out.ends_with("line 99\n"));
    }

    #[test]
    fn test_producer_error_reaches_reader() {
        let mut reader = spawn_producer("test-failing", 2, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "transfer aborted"))
        })
        .unwrap();

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_dropped_reader_stops_producer() {
        let (mut writer, reader) = pipe(1);
        drop(reader);
        let err = writer.write(b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
