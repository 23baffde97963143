// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::appendable::{Appendable, BufferTooSmall},
    zerocopy::ByteSliceMut,
};

/// Writes into a fixed-capacity buffer; appends past the end fail.
pub struct BufferWriter<B> {
    buffer: B,
    written: usize,
}

impl<B: ByteSliceMut> BufferWriter<B> {
    pub fn new(buffer: B) -> Self {
        BufferWriter { buffer, written: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.written
    }

    /// Returns the written prefix of the underlying buffer.
    pub fn into_written(self) -> B {
        let written = self.written;
        self.buffer.split_at(written).0
    }
}

impl<B: ByteSliceMut> Appendable for BufferWriter<B> {
    fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferTooSmall> {
        self.append_bytes_zeroed(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    fn append_bytes_zeroed(&mut self, len: usize) -> Result<&mut [u8], BufferTooSmall> {
        if !self.can_append(len) {
            return Err(BufferTooSmall);
        }
        let start = self.written;
        self.written += len;
        let slice = &mut self.buffer[start..start + len];
        for b in slice.iter_mut() {
            *b = 0;
        }
        Ok(slice)
    }

    fn bytes_written(&self) -> usize {
        self.written
    }

    fn can_append(&self, bytes: usize) -> bool {
        self.remaining() >= bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_within_capacity() {
        let mut buf = [0xffu8; 8];
        let mut w = BufferWriter::new(&mut buf[..]);
        w.append_bytes(&[1, 2, 3]).expect("append_bytes");
        w.append_bytes_zeroed(2).expect("append_bytes_zeroed");
        assert_eq!(3, w.remaining());
        assert_eq!(&[1, 2, 3, 0, 0][..], &w.into_written()[..]);
    }

    #[test]
    fn write_past_capacity() {
        let mut buf = [0u8; 4];
        let mut w = BufferWriter::new(&mut buf[..]);
        w.append_bytes(&[1, 2, 3]).expect("append_bytes");
        assert_eq!(Err(BufferTooSmall), w.append_bytes(&[4, 5]));
        assert_eq!(3, w.bytes_written());
        w.append_byte(4).expect("last byte fits");
        assert!(!w.can_append(1));
    }
}
