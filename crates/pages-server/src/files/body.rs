//! Streaming response bodies backed by a [`LazyFile`].

use std::io::{self, Read};

use bytes::Bytes;
use futures::Stream;
use pages_git::LazyFile;

const CHUNK_SIZE: u64 = 64 * 1024;

struct Reader {
    file: LazyFile,
    remaining: u64,
}

/// Streams the next `len` bytes of `file` from its current position.
///
/// Reads run on the blocking pool, one chunk at a time. The file is closed
/// when the stream ends or is dropped.
pub fn stream(file: LazyFile, len: u64) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let reader = Reader {
        file,
        remaining: len,
    };

    futures::stream::unfold(Some(reader), |reader| async move {
        let mut reader = reader?;

        if reader.remaining == 0 {
            reader.file.close();
            return None;
        }

        let joined = tokio::task::spawn_blocking(move || {
            let result = read_chunk(&mut reader);
            (reader, result)
        })
        .await;

        match joined {
            Ok((mut reader, Ok(chunk))) if chunk.is_empty() => {
                reader.file.close();
                let err = io::Error::new(io::ErrorKind::UnexpectedEof, "file truncated while serving");
                Some((Err(err), None))
            },
            Ok((mut reader, Ok(chunk))) => {
                reader.remaining -= chunk.len() as u64;
                Some((Ok(Bytes::from(chunk)), Some(reader)))
            },
            Ok((mut reader, Err(e))) => {
                reader.file.close();
                Some((Err(e), None))
            },
            Err(e) => Some((Err(io::Error::other(e)), None)),
        }
    })
}

fn read_chunk(reader: &mut Reader) -> io::Result<Vec<u8>> {
    let mut buf = vec![0; reader.remaining.min(CHUNK_SIZE) as usize];
    let n = reader.file.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}
