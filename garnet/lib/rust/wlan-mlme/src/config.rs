// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    serde_derive::{Deserialize, Serialize},
    wlan_common::mac::MacAddr,
};

pub const DEFAULT_LISTEN_INTERVAL: u16 = 100;
pub const MAX_AID: u16 = 2007;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpMode {
    Sta,
    Ibss,
    AhDemo,
    HostAp,
    Monitor,
}

impl Default for OpMode {
    fn default() -> Self {
        OpMode::Sta
    }
}

/// User configuration of the MLME. Missing fields take their default values when parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlmeConfig {
    pub opmode: OpMode,
    /// SSID to join or, when creating an IBSS or starting an AP, to advertise.
    pub ssid: Vec<u8>,
    /// Only join this BSSID.
    pub bssid: Option<MacAddr>,
    /// Only join a BSS on this channel.
    pub channel: Option<u8>,
    /// Channel used when creating an IBSS or starting an AP.
    pub ibss_channel: u8,
    /// Transmit at this rate, in 500 kb/s units.
    pub fixed_rate: Option<u8>,
    pub create_ibss: bool,
    pub wep_enabled: bool,
    pub wep_tx_key: usize,
    pub power_mgmt: bool,
    pub listen_interval: u16,
    pub max_aid: u16,
}

impl Default for MlmeConfig {
    fn default() -> Self {
        Self {
            opmode: OpMode::Sta,
            ssid: vec![],
            bssid: None,
            channel: None,
            ibss_channel: 1,
            fixed_rate: None,
            create_ibss: false,
            wep_enabled: false,
            wep_tx_key: 0,
            power_mgmt: false,
            listen_interval: DEFAULT_LISTEN_INTERVAL,
            max_aid: MAX_AID,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub wep: bool,
    pub power_mgmt: bool,
    pub ibss: bool,
    pub hostap: bool,
    pub ahdemo: bool,
    pub monitor: bool,
    /// The device buffers frames for dozing stations itself.
    pub power_save_buffering: bool,
}

impl DeviceCapabilities {
    pub fn supports(&self, opmode: OpMode) -> bool {
        match opmode {
            OpMode::Sta => true,
            OpMode::Ibss => self.ibss,
            OpMode::AhDemo => self.ahdemo,
            OpMode::HostAp => self.hostap,
            OpMode::Monitor => self.monitor,
        }
    }
}

/// Static properties of the device the MLME drives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub addr: MacAddr,
    /// Supported rates, in 500 kb/s units. Basic rates carry the 0x80 bit.
    pub rates: Vec<u8>,
    pub channels: Vec<u8>,
    pub caps: DeviceCapabilities,
}

/// Result of a configuration change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigOutcome {
    Applied,
    /// The change only takes effect after `Mlme::reset`.
    ResetRequired,
}
