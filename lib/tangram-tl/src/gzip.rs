// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The `gzip_packed` envelope:
//!
//! ```tl
//! gzip_packed#3072cfa1 packed_data:string = Object;
//! ```
//!
//! Any boxed value may arrive wrapped in one of these; large outgoing
//! bodies may be wrapped before transmission.

use std::io::Write;

use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;

use crate::errors::Error;
use crate::primitives::write_bytes;
use crate::GZIP_PACKED_ID;

/// Wraps already-serialized wire bytes in a `gzip_packed` envelope.
pub fn pack(unpacked: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    // Safe to unwrap, in-memory data should not fail.
    encoder.write_all(unpacked).unwrap();
    let packed = encoder.finish().unwrap();

    let mut out = Vec::with_capacity(packed.len() + 8);
    out.extend_from_slice(&GZIP_PACKED_ID.to_le_bytes());
    write_bytes(&mut out, &packed);
    out
}

/// Decompresses the payload of a `gzip_packed` envelope.
pub fn decompress(packed: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoder = GzDecoder::new(Vec::new());
    decoder
        .write_all(packed)
        .map_err(|_| Error::DecompressionFailed)?;
    decoder.finish().map_err(|_| Error::DecompressionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use crate::primitives::{read_bytes, read_u32};

    #[test]
    fn check_round_trip() {
        let body = b"not very compressible".repeat(20);
        let envelope = pack(&body);

        let mut cursor = Cursor::from_slice(&envelope);
        assert_eq!(read_u32(&mut cursor).unwrap(), GZIP_PACKED_ID);
        let packed = read_bytes(&mut cursor).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(decompress(&packed).unwrap(), body);
    }

    #[test]
    fn check_garbage() {
        assert_eq!(
            decompress(b"not gzip at all"),
            Err(Error::DecompressionFailed)
        );
    }
}
