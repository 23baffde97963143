// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{device::TransportError, wep::WepError},
    thiserror::Error,
    wlan_common::{
        appendable::BufferTooSmall,
        error::{FrameParseError, FrameWriteError},
    },
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("provided buffer to small")]
    BufferTooSmall,
    #[error("error parsing frame: {0}")]
    ParsingFrame(#[from] FrameParseError),
    #[error("error writing frame: {0}")]
    WritingFrame(#[from] FrameWriteError),
    #[error("wep: {0}")]
    Wep(#[from] WepError),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<BufferTooSmall> for Error {
    fn from(_: BufferTooSmall) -> Self {
        Error::BufferTooSmall
    }
}

/// Returned by `Mlme::transmit` when the pending transmit queue is full.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("transmit queue is full")]
pub struct Busy;
