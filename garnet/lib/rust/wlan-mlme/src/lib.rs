// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! This crate implements the IEEE Std 802.11 MAC sublayer management entity for SoftMAC
//! devices: scanning and BSS selection, open-system authentication and association as a
//! station, an IBSS member or an access point, WEP, and power-save buffering for dozing
//! stations. The device underneath is reached through [`device::DeviceOps`]; timers go
//! through a [`timer::Scheduler`].

pub mod channel;
pub mod config;
pub mod device;
pub mod error;
mod mlme;
pub mod node;
pub mod ps;
pub mod rates;
pub mod timer;
pub mod wep;

pub use {
    mlme::{
        MatchFailures, Mlme, NodeKey, State, Stats, TimedEvent, INACT_MAX, INACT_WAIT,
        SCAN_DWELL, TRANS_WAIT, TX_QUEUE_LIMIT,
    },
    wlan_common as common,
};

use {
    crate::{device::DeviceOps, error::Busy, timer::EventId},
    parking_lot::{Mutex, MutexGuard},
    std::sync::Arc,
};

/// Shares an `Mlme` between the threads delivering frames, timeouts and control requests.
/// Every event is processed to completion under one lock.
pub struct MlmeHandle<D> {
    inner: Arc<Mutex<Mlme<D>>>,
}

impl<D> Clone for MlmeHandle<D> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<D: DeviceOps> MlmeHandle<D> {
    pub fn new(mlme: Mlme<D>) -> Self {
        Self { inner: Arc::new(Mutex::new(mlme)) }
    }

    pub fn start(&self) {
        self.inner.lock().start()
    }

    pub fn stop(&self) {
        self.inner.lock().stop()
    }

    pub fn frame_received(&self, frame: &[u8], rssi: i8, rstamp: u64) {
        self.inner.lock().frame_received(frame, rssi, rstamp)
    }

    pub fn transmit(&self, eth_frame: &[u8]) -> Result<(), Busy> {
        self.inner.lock().transmit(eth_frame)
    }

    pub fn handle_timeout(&self, event_id: EventId) {
        self.inner.lock().handle_timeout(event_id)
    }

    /// Locks the MLME for control-plane access.
    pub fn lock(&self) -> MutexGuard<'_, Mlme<D>> {
        self.inner.lock()
    }
}
