// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

/// A frame held in one or more byte segments, as handed over by drivers that chain
/// receive buffers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuf {
    segments: Vec<Vec<u8>>,
}

impl FrameBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Vec<u8>>) -> Self {
        FrameBuf { segments: segments.into_iter().filter(|s| !s.is_empty()).collect() }
    }

    pub fn push_segment(&mut self, segment: Vec<u8>) {
        if !segment.is_empty() {
            self.segments.push(segment);
        }
    }

    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.segments.iter().map(|s| &s[..])
    }

    /// Returns the bytes from `offset` to the end, one slice per segment.
    pub fn chunks_from(&self, offset: usize) -> impl Iterator<Item = &[u8]> {
        let mut skip = offset;
        self.segments.iter().filter_map(move |segment| {
            if skip >= segment.len() {
                skip -= segment.len();
                None
            } else {
                let chunk = &segment[skip..];
                skip = 0;
                Some(chunk)
            }
        })
    }

    /// Returns a contiguous view of the first `len` bytes, merging leading segments if
    /// they are split. Returns `None` if the frame is shorter than `len`.
    pub fn pullup(&mut self, len: usize) -> Option<&[u8]> {
        if self.len() < len {
            return None;
        }
        if len == 0 {
            return Some(&[]);
        }
        if self.segments[0].len() < len {
            let mut rest = self.segments.drain(..).collect::<Vec<_>>().into_iter();
            let mut head = rest.next().unwrap_or_default();
            while head.len() < len {
                match rest.next() {
                    Some(next) => head.extend_from_slice(&next[..]),
                    None => break,
                }
            }
            self.segments.push(head);
            self.segments.extend(rest);
        }
        Some(&self.segments[0][..len])
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.segments.concat()
    }
}

impl From<Vec<u8>> for FrameBuf {
    fn from(bytes: Vec<u8>) -> Self {
        FrameBuf::from_segments(vec![bytes])
    }
}

impl From<&[u8]> for FrameBuf {
    fn from(bytes: &[u8]) -> Self {
        FrameBuf::from(bytes.to_vec())
    }
}
