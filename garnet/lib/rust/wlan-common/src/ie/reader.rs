// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{Header, Id},
    crate::buffer_reader::BufferReader,
    std::mem::size_of,
    zerocopy::ByteSlice,
};

/// Iterates over the elements of a management frame body. Iteration ends at the first
/// element whose body runs past the end of the buffer.
pub struct Reader<B>(BufferReader<B>);

impl<B: ByteSlice> Reader<B> {
    pub fn new(bytes: B) -> Self {
        Reader(BufferReader::new(bytes))
    }
}

impl<B: ByteSlice> Iterator for Reader<B> {
    type Item = (Id, B);

    fn next(&mut self) -> Option<Self::Item> {
        let body_len = self.0.peek::<Header>()?.body_len as usize;
        if self.0.bytes_remaining() < size_of::<Header>() + body_len {
            return None;
        }
        let header = self.0.read::<Header>()?;
        let body = self.0.read_bytes(body_len)?;
        Some((header.id, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_read() {
        assert_eq!(None, Reader::new(&[][..]).next());
        // A lone id byte is not a header.
        assert_eq!(None, Reader::new(&[1][..]).next());
        // The header promises more than is left.
        assert_eq!(None, Reader::new(&[1, 4, 0x82, 0x84][..]).next());
    }

    #[rustfmt::skip]
    #[test]
    fn ssid_rates_and_empty_element() {
        let bytes = [
            0, 3, b'f', b'o', b'o', // SSID
            1, 2, 0x82, 0x84, // Supported rates
            221, 0, // Vendor specific, empty
        ];
        let elems: Vec<_> = Reader::new(&bytes[..]).collect();
        assert_eq!(
            &[
                (Id::SSID, &b"foo"[..]),
                (Id::SUPPORTED_RATES, &[0x82, 0x84][..]),
                (Id(221), &[][..]),
            ],
            &elems[..]
        );
    }

    #[test]
    fn truncated_trailing_element() {
        let bytes = [3, 1, 6, 0, 5, 1, 2];
        let elems: Vec<_> = Reader::new(&bytes[..]).collect();
        assert_eq!(&[(Id::DSSS_PARAM_SET, &[6][..])], &elems[..]);
    }
}
