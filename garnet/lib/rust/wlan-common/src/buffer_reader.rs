// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    std::mem::size_of,
    zerocopy::{ByteSlice, LayoutVerified, Unaligned},
};

/// Reads typed, unaligned values off the front of a byte slice.
pub struct BufferReader<B> {
    buffer: Option<B>,
    bytes_read: usize,
}

impl<B: ByteSlice> BufferReader<B> {
    pub fn new(bytes: B) -> Self {
        BufferReader { buffer: Some(bytes), bytes_read: 0 }
    }

    pub fn peek<T: Unaligned>(&self) -> Option<LayoutVerified<&[u8], T>> {
        let bytes = self.buffer.as_deref()?;
        LayoutVerified::new_unaligned_from_prefix(bytes).map(|(value, _)| value)
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.buffer.as_deref()?.first().copied()
    }

    pub fn read<T: Unaligned>(&mut self) -> Option<LayoutVerified<B, T>> {
        self.read_bytes(size_of::<T>()).and_then(LayoutVerified::new_unaligned)
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|bytes| bytes[0])
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<B> {
        if len > self.bytes_remaining() {
            return None;
        }
        let (head, tail) = self.buffer.take()?.split_at(len);
        self.buffer = Some(tail);
        self.bytes_read += len;
        Some(head)
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    pub fn bytes_remaining(&self) -> usize {
        self.buffer.as_deref().map_or(0, |b| b.len())
    }

    pub fn into_remaining(self) -> Option<B> {
        self.buffer
    }
}
