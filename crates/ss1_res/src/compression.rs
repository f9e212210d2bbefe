//! Resource compression and decompression handling.
//!
//! Compressed resources store their data as a single zlib stream. For compound resources the stream
//! covers all blocks after the block table.

use std::io::{self, Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use tracing::instrument;

/// Reader for data that may be stored compressed
pub(crate) enum DataReader<R: Read> {
    Raw(R),
    Compressed(Box<ZlibDecoder<R>>),
}

impl<R: Read> DataReader<R> {
    pub fn new(reader: R, compressed: bool) -> Self {
        if compressed {
            DataReader::Compressed(Box::new(ZlibDecoder::new(reader)))
        } else {
            DataReader::Raw(reader)
        }
    }
}

impl<R: Read> Read for DataReader<R> {
    #[instrument(level = "trace", skip_all, err)]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DataReader::Raw(r) => r.read(buf),
            DataReader::Compressed(r) => r.read(buf),
        }
    }

    #[instrument(level = "trace", skip_all, err)]
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        match self {
            DataReader::Raw(r) => r.read_to_end(buf),
            DataReader::Compressed(r) => r.read_to_end(buf),
        }
    }
}

/// Compresses the data into a single zlib stream
#[instrument(skip(data), fields(size = data.len()), err)]
pub(crate) fn compress(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}
