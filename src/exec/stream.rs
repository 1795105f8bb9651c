//! Byte-stream plumbing between the parent and a child's standard streams.

use std::io::{ErrorKind, Read, Write};

/// Default bounded read size when draining a captured stream.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Read `stream` to end-of-file in chunks of at most `chunk_size` bytes.
///
/// Interrupted reads are retried. Any other read error ends the stream the
/// same way end-of-file does; whatever was collected so far is returned.
pub fn drain<R: Read>(mut stream: R, chunk_size: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break, // EOF
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!(error = %e, collected = buf.len(), "read ended with error");
                break;
            }
        }
    }

    buf
}

/// Write all of `input` to `sink`, tolerating partial writes.
///
/// Stops early if the reader goes away (typically a broken pipe because the
/// child exited without consuming its input). Returns the number of bytes
/// accepted. The sink is dropped on return, which closes it.
pub fn feed<W: Write>(mut sink: W, input: &[u8]) -> usize {
    let mut written = 0;

    while written < input.len() {
        match sink.write(&input[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                if e.kind() == ErrorKind::BrokenPipe {
                    tracing::warn!(
                        written,
                        total = input.len(),
                        "child stopped reading its input"
                    );
                } else {
                    tracing::warn!(error = %e, written, "failed to write child input");
                }
                break;
            }
        }
    }

    written
}
