// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LinkStatus(u8);

impl LinkStatus {
    pub const DOWN: Self = Self(0);
    pub const UP: Self = Self(1);
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TransportError {
    #[error("transport is busy")]
    Busy,
    #[error("transport failure: {0}")]
    Io(String),
}

/// The MLME's view of the driver underneath it and the network stack above it.
pub trait DeviceOps {
    /// Hands a decapsulated Ethernet II frame to the network stack.
    fn deliver_eth_frame(&mut self, frame: &[u8]) -> Result<(), anyhow::Error>;
    /// Queues a complete 802.11 frame for transmission.
    fn send_wlan_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;
    fn set_channel(&mut self, chan: u8) -> Result<(), TransportError>;
    /// Sets or clears the traffic indication bit for `aid` in beacons sent by the device.
    fn set_tim(&mut self, aid: u16, set: bool);
    fn set_link_status(&mut self, status: LinkStatus);
}

#[cfg(test)]
pub use test_utils::*;
