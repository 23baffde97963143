// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {crate::appendable::BufferTooSmall, thiserror::Error};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("error parsing frame: {0}")]
pub struct FrameParseError(pub(crate) String);

impl FrameParseError {
    pub fn new<T: Into<String>>(debug_message: T) -> Self {
        FrameParseError(debug_message.into())
    }

    pub fn debug_message(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameWriteError {
    #[error("buffer is too small")]
    BufferTooSmall,
    #[error("error writing frame: {0}")]
    InvalidData(String),
}

impl FrameWriteError {
    pub fn new_invalid_data<T: Into<String>>(debug_message: T) -> Self {
        FrameWriteError::InvalidData(debug_message.into())
    }
}

impl From<BufferTooSmall> for FrameWriteError {
    fn from(_error: BufferTooSmall) -> Self {
        FrameWriteError::BufferTooSmall
    }
}
