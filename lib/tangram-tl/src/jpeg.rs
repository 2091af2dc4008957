// Copyright 2026 - developers of the `tangram` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reconstruction of `photoStrippedSize` thumbnails.
//!
//! Stripped thumbnails ship only the entropy-coded scan data, prefixed
//! with `0x01` and the height and width in units of pixels. The JPEG
//! container around it never varies, so the headers (standard
//! quantization and Huffman tables, baseline frame, scan header) are
//! rebuilt here and the footer is a plain end-of-image marker.

/// The zigzag scan order of the 64 coefficients in an 8x8 block.
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Standard luminance quantization table, natural order.
const QUANT_LUMA: [u8; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69,
    56, 14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104,
    113, 92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// Standard chrominance quantization table, natural order.
const QUANT_CHROMA: [u8; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99,
    99, 47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

/// Standard DC Huffman tables: code-length counts, then values.
const DC_LUMA_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
const DC_CHROMA_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];
const DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard AC Huffman tables: code-length counts, then values.
const AC_LUMA_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7d];
const AC_LUMA_VALUES: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61,
    0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52,
    0xd1, 0xf0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25,
    0x26, 0x27, 0x28, 0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45,
    0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64,
    0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83,
    0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99,
    0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6,
    0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3,
    0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8,
    0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
];
const AC_CHROMA_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77];
const AC_CHROMA_VALUES: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61,
    0x71, 0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33,
    0x52, 0xf0, 0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18,
    0x19, 0x1a, 0x26, 0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44,
    0x45, 0x46, 0x47, 0x48, 0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63,
    0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a,
    0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97,
    0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4,
    0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca,
    0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7,
    0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa,
];

fn push_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.push(0xff);
    out.push(marker);
    let len = payload.len() + 2;
    out.push((len >> 8) as u8);
    out.push((len & 0xff) as u8);
    out.extend_from_slice(payload);
}

fn quant_segment(id: u8, table: &[u8; 64]) -> Vec<u8> {
    let mut payload = vec![id];
    payload.extend(ZIGZAG.iter().map(|&i| table[i]));
    payload
}

fn huffman_segment(class_and_id: u8, bits: &[u8; 16], values: &[u8]) -> Vec<u8> {
    let mut payload = vec![class_and_id];
    payload.extend_from_slice(bits);
    payload.extend_from_slice(values);
    payload
}

/// Whether a `photoStrippedSize` payload looks inflatable: version
/// byte `0x01` followed by the dimensions.
pub fn is_stripped(payload: &[u8]) -> bool {
    payload.len() >= 3 && payload[0] == 0x01
}

/// Rebuilds a full JPEG from a stripped thumbnail payload.
///
/// The payload layout is `[0x01, height, width, scan-data...]`; the
/// returned bytes are a complete baseline JPEG of `width x height`
/// pixels with 4:2:0 chroma subsampling.
pub fn inflate_stripped(payload: &[u8]) -> Vec<u8> {
    debug_assert!(is_stripped(payload));
    let height = payload[1] as u16;
    let width = payload[2] as u16;
    let scan = &payload[3..];

    let mut out = Vec::with_capacity(scan.len() + 640);

    // SOI, APP0 "JFIF" with no thumbnail.
    out.extend_from_slice(&[0xff, 0xd8]);
    push_segment(
        &mut out,
        0xe0,
        &[b'J', b'F', b'I', b'F', 0, 1, 1, 0, 0, 1, 0, 1, 0, 0],
    );

    push_segment(&mut out, 0xdb, &quant_segment(0, &QUANT_LUMA));
    push_segment(&mut out, 0xdb, &quant_segment(1, &QUANT_CHROMA));

    // Baseline frame: 8-bit, three components, luma sampled 2x2.
    push_segment(
        &mut out,
        0xc0,
        &[
            8,
            (height >> 8) as u8,
            (height & 0xff) as u8,
            (width >> 8) as u8,
            (width & 0xff) as u8,
            3,
            1,
            0x22,
            0,
            2,
            0x11,
            1,
            3,
            0x11,
            1,
        ],
    );

    push_segment(&mut out, 0xc4, &huffman_segment(0x00, &DC_LUMA_BITS, &DC_VALUES));
    push_segment(&mut out, 0xc4, &huffman_segment(0x10, &AC_LUMA_BITS, &AC_LUMA_VALUES));
    push_segment(&mut out, 0xc4, &huffman_segment(0x01, &DC_CHROMA_BITS, &DC_VALUES));
    push_segment(&mut out, 0xc4, &huffman_segment(0x11, &AC_CHROMA_BITS, &AC_CHROMA_VALUES));

    // Scan header, then the stripped entropy-coded data.
    push_segment(&mut out, 0xda, &[3, 1, 0x00, 2, 0x11, 3, 0x11, 0, 63, 0]);
    out.extend_from_slice(scan);

    // EOI.
    out.extend_from_slice(&[0xff, 0xd9]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_structure() {
        let stripped = [0x01, 0x28, 0x20, 0xde, 0xad, 0xbe, 0xef];
        assert!(is_stripped(&stripped));
        let jpeg = inflate_stripped(&stripped);

        assert_eq!(&jpeg[..2], [0xff, 0xd8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], [0xff, 0xd9]);
        // The scan data sits right before the footer.
        assert_eq!(&jpeg[jpeg.len() - 6..jpeg.len() - 2], [0xde, 0xad, 0xbe, 0xef]);

        // The frame header carries the dimensions: height 0x28 (40),
        // width 0x20 (32).
        let sof = jpeg.windows(2).position(|w| w == [0xff, 0xc0]).unwrap();
        assert_eq!(&jpeg[sof + 5..sof + 9], [0x00, 0x28, 0x00, 0x20]);
    }

    #[test]
    fn check_not_stripped() {
        assert!(!is_stripped(&[]));
        assert!(!is_stripped(&[0x02, 1, 1]));
    }
}
