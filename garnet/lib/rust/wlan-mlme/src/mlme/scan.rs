// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{Mlme, NodeKey, State},
    crate::{
        config::OpMode,
        device::DeviceOps,
        node::Node,
        rates::{fix_rate, FixRateFlags},
    },
    log::{debug, info, warn},
    std::ops::BitOr,
    wlan_common::mac::{CapabilityInfo, MacAddr},
};

/// Reasons a scanned BSS is unsuitable. Each bit is evaluated independently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchFailures(pub u8);

impl MatchFailures {
    pub const CHANNEL: Self = Self(0x01);
    pub const CAPABILITY: Self = Self(0x02);
    pub const PRIVACY: Self = Self(0x04);
    pub const RATES: Self = Self(0x08);
    pub const SSID: Self = Self(0x10);
    pub const BSSID: Self = Self(0x20);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MatchFailures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl<D: DeviceOps> Mlme<D> {
    pub(crate) fn begin_scan(&mut self) {
        self.chans.scan = self.chans.active;
        match self.chans.scan.highest() {
            Some(chan) => {
                self.chans.scan.remove(chan);
                self.bss.chan = chan;
            }
            None => warn!("no active channels to scan"),
        }
        debug!("begin scan on channels {:?}", self.chans.active);
        self.active_scan = true;
        self.tune(self.bss.chan);
        self.send_probe_req(NodeKey::Bss);
        self.arm_scan_timer();
    }

    /// Moves to the next channel left in this pass, or ends the scan.
    pub(crate) fn next_scan(&mut self) {
        match self.chans.scan.next_after(self.bss.chan) {
            Some(chan) => {
                self.chans.scan.remove(chan);
                debug!("scanning channel {}", chan);
                self.bss.chan = chan;
                self.tune(chan);
                self.new_state(State::Scan, None);
                self.arm_scan_timer();
            }
            None => self.end_scan(),
        }
    }

    pub(crate) fn match_bss(&self, node: &Node) -> MatchFailures {
        let mut fail = MatchFailures::default();
        let pinned_chan = self.config.channel.map_or(false, |chan| chan != node.chan);
        if !self.chans.active.contains(node.chan) || pinned_chan {
            fail = fail | MatchFailures::CHANNEL;
        }
        let cap_ok = if self.config.opmode == OpMode::Ibss {
            node.capabilities.ibss()
        } else {
            node.capabilities.ess()
        };
        if !cap_ok {
            fail = fail | MatchFailures::CAPABILITY;
        }
        if node.capabilities.privacy() != self.config.wep_enabled {
            fail = fail | MatchFailures::PRIVACY;
        }
        let mut rates = node.rates.clone();
        if fix_rate(&mut rates, &self.info.rates, self.config.fixed_rate, FixRateFlags::NEGOTIATE)
            .is_err()
        {
            fail = fail | MatchFailures::RATES;
        }
        if !self.config.ssid.is_empty() && self.config.ssid != node.ssid {
            fail = fail | MatchFailures::SSID;
        }
        if self.config.bssid.map_or(false, |bssid| bssid != node.bssid) {
            fail = fail | MatchFailures::BSSID;
        }
        fail
    }

    pub(crate) fn end_scan(&mut self) {
        debug!("end scan; candidates:");
        let mut selected: Option<(MacAddr, i8)> = None;
        for addr in self.nodes.addrs() {
            let prev_fails = match self.nodes.find_mut(&addr) {
                Some(node) if node.fails > 0 => {
                    let prev = node.fails;
                    node.fails += 1;
                    prev
                }
                Some(_) => 0,
                None => continue,
            };
            if prev_fails > 0 {
                if prev_fails > 2 {
                    self.free_node(&addr);
                }
                continue;
            }
            let (failures, rssi) = match self.nodes.find(&addr) {
                Some(node) => {
                    let failures = self.match_bss(node);
                    debug!(
                        "  {:02x?} chan {} rssi {} ssid {:?} failures {:#04x}",
                        node.bssid,
                        node.chan,
                        node.rssi,
                        String::from_utf8_lossy(&node.ssid),
                        failures.0
                    );
                    (failures, node.rssi)
                }
                None => continue,
            };
            if failures.is_empty() && selected.map_or(true, |(_, best)| rssi > best) {
                selected = Some((addr, rssi));
            }
        }

        let winner = match selected.and_then(|(addr, _)| self.nodes.find(&addr).cloned()) {
            Some(node) => node,
            None => return self.scan_not_found(),
        };
        self.bss.copy_from(&winner);
        if self.config.opmode == OpMode::Ibss {
            let _ = fix_rate(
                &mut self.bss.rates,
                &self.info.rates,
                self.config.fixed_rate,
                FixRateFlags::FIXED_RATE | FixRateFlags::NEGOTIATE | FixRateFlags::DELETE,
            );
            if self.bss.rates.is_empty() {
                debug!("no common rates with {:02x?}", winner.bssid);
                if let Some(node) = self.nodes.find_mut(&winner.addr) {
                    node.fails += 1;
                }
                return self.scan_not_found();
            }
            self.tune(self.bss.chan);
            self.new_state(State::Run, None);
        } else {
            self.tune(self.bss.chan);
            self.new_state(State::Auth, None);
        }
    }

    fn scan_not_found(&mut self) {
        if self.config.opmode == OpMode::Ibss
            && self.config.create_ibss
            && !self.config.ssid.is_empty()
        {
            return self.create_ibss();
        }
        if self.active_scan {
            debug!("nothing found, switching to passive scan");
            self.active_scan = false;
        }
        if self.chans.active.is_empty() {
            warn!("no active channels to scan");
            self.arm_scan_timer();
            return;
        }
        self.chans.scan = self.chans.active;
        self.next_scan();
    }

    /// Starts a BSS of our own: an IBSS in ad-hoc modes, an infrastructure BSS as an AP.
    pub(crate) fn create_ibss(&mut self) {
        let hostap = self.config.opmode == OpMode::HostAp;
        let my_addr = self.my_addr();
        self.ibss_synced = true;
        self.bss.rates = self.info.rates.clone();
        self.bss.addr = my_addr;
        self.bss.bssid = my_addr;
        if !hostap {
            self.bss.bssid[0] |= 0x02;
        }
        self.bss.ssid = self.config.ssid.clone();
        self.bss.rssi = 0;
        self.bss.rstamp = 0;
        self.bss.tstamp = 0;
        self.bss.beacon_interval = self.config.listen_interval;
        let mut cap = CapabilityInfo(0);
        if hostap {
            cap.set_ess(true);
        } else {
            cap.set_ibss(true);
        }
        cap.set_privacy(self.config.wep_enabled);
        self.bss.capabilities = cap;
        self.bss.chan = self.config.ibss_channel;
        info!(
            "creating {} {:?} on channel {}",
            if hostap { "BSS" } else { "IBSS" },
            String::from_utf8_lossy(&self.bss.ssid),
            self.bss.chan
        );
        self.new_state(State::Run, None);
    }
}
