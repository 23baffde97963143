// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{Mlme, NodeKey},
    crate::{config::OpMode, device::DeviceOps, device::LinkStatus},
    log::{debug, info, warn},
    wlan_common::mac::{MgmtSubtype, ReasonCode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    Scan,
    Auth,
    Assoc,
    Run,
}

/// The management frame which caused a transition, and the node which sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cause {
    pub subtype: MgmtSubtype,
    pub peer: NodeKey,
}

impl Cause {
    pub fn new(subtype: MgmtSubtype, peer: NodeKey) -> Self {
        Self { subtype, peer }
    }
}

fn is_valid_transition(from: State, to: State) -> bool {
    match to {
        State::Init | State::Scan => true,
        State::Auth => from != State::Init,
        State::Assoc => from == State::Auth || from == State::Run,
        State::Run => from == State::Scan || from == State::Assoc,
    }
}

impl<D: DeviceOps> Mlme<D> {
    pub(crate) fn new_state(&mut self, next: State, cause: Option<Cause>) {
        let prev = self.state;
        if !is_valid_transition(prev, next) {
            warn!("invalid state transition {:?} -> {:?}", prev, next);
            return;
        }
        if prev != next {
            debug!("{:?} -> {:?}", prev, next);
        }
        self.state = next;
        match next {
            State::Init => self.enter_init(prev),
            State::Scan => self.enter_scan(prev),
            State::Auth => self.enter_auth(prev, cause),
            State::Assoc => self.enter_assoc(prev),
            State::Run => self.enter_run(),
        }
        if prev == State::Run && self.state != State::Run {
            self.device.set_link_status(LinkStatus::DOWN);
        }
    }

    fn enter_init(&mut self, prev: State) {
        if prev == State::Run {
            match self.config.opmode {
                OpMode::Sta => {
                    self.send_disassoc(NodeKey::Bss, ReasonCode::LEAVING_NETWORK_DISASSOC)
                }
                OpMode::HostAp => {
                    let associated: Vec<_> =
                        self.nodes.iter().filter(|n| n.is_associated()).map(|n| n.addr).collect();
                    for addr in associated {
                        self.send_disassoc(
                            NodeKey::Peer(addr),
                            ReasonCode::LEAVING_NETWORK_DISASSOC,
                        );
                    }
                }
                _ => (),
            }
        }
        if prev == State::Run || prev == State::Assoc {
            match self.config.opmode {
                OpMode::Sta => self.send_deauth(NodeKey::Bss, ReasonCode::LEAVING_NETWORK_DEAUTH),
                OpMode::HostAp => {
                    for addr in self.nodes.addrs() {
                        self.send_deauth(NodeKey::Peer(addr), ReasonCode::LEAVING_NETWORK_DEAUTH);
                    }
                }
                _ => (),
            }
        }
        if prev != State::Init {
            self.cancel_mgmt_timer();
            self.cancel_scan_timer();
            self.tx_queue.clear();
            self.free_all_nodes();
        }
    }

    fn enter_scan(&mut self, prev: State) {
        let (candidate, bssid) = (self.bss.addr, self.bss.bssid);
        self.ibss_synced = false;
        self.reset_bss();
        match prev {
            State::Init => {
                self.bss.txrate = 0;
                self.begin_scan();
            }
            State::Scan => {
                if self.active_scan {
                    self.send_probe_req(NodeKey::Bss);
                }
            }
            State::Auth | State::Assoc => {
                if let Some(node) = self.nodes.find_mut(&candidate) {
                    node.fails += 1;
                }
                self.begin_scan();
            }
            State::Run => {
                info!("lost contact with {:02x?}, rescanning", bssid);
                if self.config.opmode == OpMode::HostAp {
                    for addr in self.nodes.addrs() {
                        self.send_deauth(NodeKey::Peer(addr), ReasonCode::LEAVING_NETWORK_DEAUTH);
                    }
                }
                self.free_all_nodes();
                self.begin_scan();
            }
        }
    }

    fn enter_auth(&mut self, prev: State, cause: Option<Cause>) {
        match (prev, cause) {
            (State::Scan, _) => self.send_auth(NodeKey::Bss, 1),
            (State::Auth, Some(cause)) | (State::Assoc, Some(cause))
                if cause.subtype == MgmtSubtype::Auth =>
            {
                self.send_auth(cause.peer, 2)
            }
            (State::Run, Some(cause)) => match cause.subtype {
                MgmtSubtype::Auth => {
                    self.send_auth(cause.peer, 2);
                    self.state = State::Run;
                }
                MgmtSubtype::Deauth => self.send_auth(NodeKey::Bss, 1),
                _ => (),
            },
            _ => (),
        }
    }

    fn enter_assoc(&mut self, prev: State) {
        match prev {
            State::Auth => self.send_assoc_req(NodeKey::Bss, false),
            State::Run => self.send_assoc_req(NodeKey::Bss, true),
            _ => (),
        }
    }

    fn enter_run(&mut self) {
        match self.config.opmode {
            OpMode::Sta => info!(
                "associated with {:02x?} ssid {:?} channel {}",
                self.bss.bssid,
                String::from_utf8_lossy(&self.bss.ssid),
                self.bss.chan
            ),
            _ => info!(
                "synchronized with {:02x?} ssid {:?} channel {}",
                self.bss.bssid,
                String::from_utf8_lossy(&self.bss.ssid),
                self.bss.chan
            ),
        }
        self.bss.txrate = self.bss.rates.len().saturating_sub(1);
        self.cancel_mgmt_timer();
        self.cancel_scan_timer();
        self.tune(self.bss.chan);
        self.device.set_link_status(LinkStatus::UP);
        self.flush_tx_queue();
    }
}
