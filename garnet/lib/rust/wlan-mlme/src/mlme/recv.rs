// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{state::Cause, Mlme, NodeKey, State},
    crate::{
        config::OpMode,
        device::DeviceOps,
        node::AID_FLAGS,
        rates::{fix_rate, FixRateFlags},
    },
    log::{debug, info, warn},
    wlan_common::{
        mac::{
            AuthAlgorithmNumber, DsDirection, FrameControl, MacAddr, MacFrame, MgmtSubtype,
            ReasonCode, StatusCode, BCAST_ADDR, FRAME_TYPE_CTRL,
        },
        mgmt::{
            decode_management, AssocReqFields, AssocRespFields, AuthFields, BssFields, MgmtBody,
            MgmtFrame,
        },
    },
};

/// Header fields shared by every frame type the MLME handles.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RxHeader {
    pub frame_ctrl: FrameControl,
    pub addr1: MacAddr,
    /// Transmitter address.
    pub addr2: MacAddr,
    pub addr3: Option<MacAddr>,
    pub seq_num: Option<u16>,
}

enum RxKind {
    Mgmt,
    Data,
    PsPoll { aid: u16 },
}

impl<D: DeviceOps> Mlme<D> {
    /// Processes one frame received from the device. `rssi` and `rstamp` describe its reception.
    pub fn frame_received(&mut self, frame: &[u8], rssi: i8, rstamp: u64) {
        let (hdr, kind) = match MacFrame::parse(frame) {
            Some(MacFrame::Mgmt { mgmt_hdr, .. }) => (
                RxHeader {
                    frame_ctrl: mgmt_hdr.frame_ctrl(),
                    addr1: mgmt_hdr.addr1,
                    addr2: mgmt_hdr.addr2,
                    addr3: Some(mgmt_hdr.addr3),
                    seq_num: Some(mgmt_hdr.seq_ctrl().seq_num()),
                },
                RxKind::Mgmt,
            ),
            Some(MacFrame::Data { data_hdr, .. }) => (
                RxHeader {
                    frame_ctrl: data_hdr.frame_ctrl(),
                    addr1: data_hdr.addr1,
                    addr2: data_hdr.addr2,
                    addr3: Some(data_hdr.addr3),
                    seq_num: Some(data_hdr.seq_ctrl().seq_num()),
                },
                RxKind::Data,
            ),
            Some(MacFrame::PsPoll { ps_poll }) => (
                RxHeader {
                    frame_ctrl: ps_poll.frame_ctrl(),
                    addr1: ps_poll.bssid,
                    addr2: ps_poll.ta,
                    addr3: None,
                    seq_num: None,
                },
                RxKind::PsPoll { aid: ps_poll.aid() },
            ),
            Some(MacFrame::Ctrl { subtype }) => {
                debug!("ignoring control frame subtype {:#x}", subtype);
                return;
            }
            Some(MacFrame::Unsupported { type_ }) => {
                debug!("dropping frame of unknown type {}", type_);
                self.stats.rx_errors += 1;
                return;
            }
            None => {
                debug!("dropping malformed frame of {} bytes", frame.len());
                self.stats.rx_errors += 1;
                return;
            }
        };

        let key = if self.state == State::Scan {
            None
        } else {
            match self.accept_from(&hdr, rssi, rstamp) {
                Some(key) => Some(key),
                None => return,
            }
        };
        if let Some(NodeKey::Peer(addr)) = key {
            self.update_power_save(addr, hdr.frame_ctrl.power_mgmt());
        }

        match kind {
            RxKind::Data => {
                if let Some(key) = key {
                    self.recv_data(frame, &hdr, key);
                }
            }
            RxKind::Mgmt => self.recv_mgmt(frame, &hdr, rssi, rstamp),
            RxKind::PsPoll { aid } => {
                if self.config.opmode == OpMode::HostAp {
                    self.recv_ps_poll(hdr.addr2, aid);
                }
            }
        }
    }

    /// Decides whether a frame belongs to our BSS and updates the sender's reception state.
    fn accept_from(&mut self, hdr: &RxHeader, rssi: i8, rstamp: u64) -> Option<NodeKey> {
        let key = match self.config.opmode {
            OpMode::Sta => {
                if hdr.addr2 != self.bss.bssid {
                    debug!("dropping frame from other bss {:02x?}", hdr.addr2);
                    return None;
                }
                NodeKey::Bss
            }
            OpMode::Ibss | OpMode::AhDemo | OpMode::HostAp => {
                let bssid = match hdr.frame_ctrl.direction() {
                    DsDirection::NoDs => hdr.addr3,
                    _ => Some(hdr.addr1),
                };
                let is_ctrl = hdr.frame_ctrl.frame_type() == FRAME_TYPE_CTRL;
                if !is_ctrl && bssid != Some(self.bss.bssid) && bssid != Some(BCAST_ADDR) {
                    debug!("dropping frame for other bss {:02x?}", bssid);
                    return None;
                }
                if self.nodes.find(&hdr.addr2).is_some() {
                    NodeKey::Peer(hdr.addr2)
                } else {
                    NodeKey::Bss
                }
            }
            OpMode::Monitor => return None,
        };

        let node = self.node_mut(key)?;
        node.rssi = rssi;
        node.rstamp = rstamp;
        if let Some(seq_num) = hdr.seq_num {
            let prev = node.rx_seq;
            node.rx_seq = seq_num;
            if hdr.frame_ctrl.retry() && prev == seq_num {
                debug!("dropping duplicate frame {} from {:02x?}", seq_num, hdr.addr2);
                return None;
            }
        }
        node.inact = 0;
        Some(key)
    }

    fn recv_mgmt(&mut self, frame: &[u8], hdr: &RxHeader, rssi: i8, rstamp: u64) {
        if hdr.frame_ctrl.direction() != DsDirection::NoDs {
            debug!("dropping management frame with DS bits set");
            self.stats.rx_errors += 1;
            return;
        }
        if self.config.opmode == OpMode::AhDemo {
            return;
        }
        let subtype = MgmtSubtype::from_raw(hdr.frame_ctrl.frame_subtype());
        let is_bss_description =
            matches!(subtype, Some(MgmtSubtype::Beacon) | Some(MgmtSubtype::ProbeResp));
        if self.state == State::Scan && !is_bss_description {
            return;
        }
        if self.state != State::Scan
            && subtype == Some(MgmtSubtype::Beacon)
            && self.config.opmode != OpMode::Ibss
        {
            return;
        }

        let mgmt = match decode_management(frame) {
            Ok(mgmt) => mgmt,
            Err(e) => {
                debug!("dropping management frame: {}", e);
                self.stats.rx_errors += 1;
                return;
            }
        };
        match &mgmt.body {
            MgmtBody::Beacon(fields) | MgmtBody::ProbeResp(fields) => {
                self.recv_beacon(&mgmt, fields, rssi, rstamp)
            }
            MgmtBody::ProbeReq(fields) => {
                self.recv_probe_req(&mgmt, &fields.ssid, &fields.rates, rssi, rstamp)
            }
            MgmtBody::Auth(fields) => self.recv_auth(&mgmt, fields),
            MgmtBody::AssocReq(fields) => self.recv_assoc_req(&mgmt, fields, rssi, rstamp),
            MgmtBody::AssocResp(fields) => self.recv_assoc_resp(&mgmt, fields),
            MgmtBody::Disassoc { reason } => self.recv_disassoc(&mgmt, *reason),
            MgmtBody::Deauth { reason } => self.recv_deauth(&mgmt, *reason),
        }
    }

    fn recv_beacon(&mut self, mgmt: &MgmtFrame, fields: &BssFields, rssi: i8, rstamp: u64) {
        if self.config.opmode != OpMode::Ibss && self.state != State::Scan {
            return;
        }
        let src = mgmt.src();
        let chan = fields.dsss_chan.unwrap_or(self.bss.chan);
        let is_new = self.nodes.find(&src).is_none();
        if is_new {
            self.alloc_node(src, false);
        }
        let node = match self.nodes.find_mut(&src) {
            Some(node) => node,
            None => return,
        };
        if is_new || !fields.ssid.is_empty() {
            node.ssid = fields.ssid.clone();
        }
        node.bssid = mgmt.bssid();
        node.rates = fields.rates.clone();
        let _ = fix_rate(&mut node.rates, &self.info.rates, None, FixRateFlags::SORT);
        node.rssi = rssi;
        node.rstamp = rstamp;
        node.tstamp = fields.timestamp;
        node.beacon_interval = fields.beacon_interval;
        node.capabilities = fields.capabilities;
        node.chan = chan;

        if self.state == State::Scan && !self.active_scan {
            self.end_scan();
        }
    }

    fn recv_probe_req(
        &mut self,
        mgmt: &MgmtFrame,
        ssid: &[u8],
        rates: &[u8],
        rssi: i8,
        rstamp: u64,
    ) {
        if self.config.opmode == OpMode::Sta || self.state != State::Run {
            return;
        }
        if !ssid.is_empty() && ssid != &self.bss.ssid[..] {
            debug!("ignoring probe request for {:?}", String::from_utf8_lossy(ssid));
            return;
        }
        let src = mgmt.src();
        let is_new = self.nodes.find(&src).is_none();
        if is_new {
            self.alloc_node(src, true);
        }
        let negotiated = match self.nodes.find_mut(&src) {
            Some(node) => {
                node.rates = rates.to_vec();
                node.rssi = rssi;
                node.rstamp = rstamp;
                let fixed_rate = self.config.fixed_rate;
                fix_rate(&mut node.rates, &self.info.rates, fixed_rate, FixRateFlags::ALL)
            }
            None => return,
        };
        match negotiated {
            Ok(_) => self.send_probe_resp(NodeKey::Peer(src)),
            Err(rate) => debug!("no common rate with {:02x?} (last {:#x})", src, rate),
        }
        if is_new && self.config.opmode == OpMode::HostAp {
            self.free_node(&src);
        }
    }

    fn recv_auth(&mut self, mgmt: &MgmtFrame, fields: &AuthFields) {
        if fields.algorithm != AuthAlgorithmNumber::OPEN {
            debug!("unsupported auth algorithm {} from {:02x?}", fields.algorithm.0, mgmt.src());
            return;
        }
        let src = mgmt.src();
        match self.config.opmode {
            OpMode::Ibss => {
                if self.state != State::Run || fields.seq != 1 {
                    return;
                }
                if self.nodes.find(&src).is_none() {
                    self.alloc_node(src, true);
                }
                self.new_state(
                    State::Auth,
                    Some(Cause::new(MgmtSubtype::Auth, NodeKey::Peer(src))),
                );
            }
            OpMode::HostAp => {
                if self.state != State::Run || fields.seq != 1 {
                    return;
                }
                let is_new = self.nodes.find(&src).is_none();
                if is_new {
                    let bssid = self.bss.bssid;
                    self.alloc_node(src, false).bssid = bssid;
                }
                self.send_auth(NodeKey::Peer(src), 2);
                info!(
                    "station {:02x?} {} authenticated",
                    src,
                    if is_new { "newly" } else { "already" }
                );
            }
            OpMode::Sta => {
                if self.state != State::Auth || fields.seq != 2 {
                    return;
                }
                if fields.status != StatusCode::SUCCESS {
                    warn!(
                        "authentication with {:02x?} failed, status {}",
                        mgmt.bssid(),
                        fields.status.0
                    );
                    if let Some(node) = self.nodes.find_mut(&src) {
                        node.fails += 1;
                    }
                    return;
                }
                self.new_state(State::Assoc, Some(Cause::new(MgmtSubtype::Auth, NodeKey::Bss)));
            }
            OpMode::AhDemo | OpMode::Monitor => (),
        }
    }

    fn release_aid(&mut self, addr: &MacAddr) {
        let aid = match self.nodes.find_mut(addr) {
            Some(node) => std::mem::replace(&mut node.aid, 0),
            None => return,
        };
        if aid != 0 {
            self.nodes.clear_aid(aid);
        }
    }

    fn recv_assoc_req(&mut self, mgmt: &MgmtFrame, fields: &AssocReqFields, rssi: i8, rstamp: u64) {
        if self.config.opmode != OpMode::HostAp || self.state != State::Run {
            return;
        }
        let reassoc = fields.current_ap.is_some();
        if mgmt.bssid() != self.bss.bssid {
            debug!("ignoring association request for bss {:02x?}", mgmt.bssid());
            return;
        }
        if fields.ssid != self.bss.ssid {
            debug!("ignoring association request for {:?}", String::from_utf8_lossy(&fields.ssid));
            return;
        }
        let src = mgmt.src();
        if self.nodes.find(&src).is_none() {
            debug!("association request from unauthenticated station {:02x?}", src);
            self.alloc_node(src, true);
            self.send_deauth(NodeKey::Peer(src), ReasonCode::NOT_AUTHENTICATED);
            self.free_node(&src);
            return;
        }
        if !fields.capabilities.ess() || fields.capabilities.privacy() != self.config.wep_enabled {
            debug!("capability mismatch with {:02x?}", src);
            self.release_aid(&src);
            let status = StatusCode::REFUSED_CAPABILITIES_MISMATCH;
            self.send_assoc_resp(NodeKey::Peer(src), reassoc, status);
            return;
        }
        let has_rates = match self.nodes.find_mut(&src) {
            Some(node) => {
                node.rates = fields.rates.clone();
                let _ = fix_rate(
                    &mut node.rates,
                    &self.info.rates,
                    self.config.fixed_rate,
                    FixRateFlags::ALL,
                );
                !node.rates.is_empty()
            }
            None => return,
        };
        if !has_rates {
            debug!("no common rates with {:02x?}", src);
            self.release_aid(&src);
            let status = StatusCode::REFUSED_BASIC_RATES_MISMATCH;
            self.send_assoc_resp(NodeKey::Peer(src), reassoc, status);
            return;
        }

        let chan = self.bss.chan;
        let needs_aid = match self.nodes.find_mut(&src) {
            Some(node) => {
                node.rssi = rssi;
                node.rstamp = rstamp;
                node.beacon_interval = fields.listen_interval;
                node.capabilities = fields.capabilities;
                node.chan = chan;
                node.aid == 0
            }
            None => return,
        };
        let newly = needs_aid;
        if needs_aid {
            let aid = match self.nodes.alloc_aid(self.config.max_aid) {
                Some(aid) => aid,
                None => {
                    warn!("no association ids left, refusing {:02x?}", src);
                    let status = StatusCode::DENIED_NO_MORE_STAS;
                    self.send_assoc_resp(NodeKey::Peer(src), reassoc, status);
                    return;
                }
            };
            if let Some(node) = self.nodes.find_mut(&src) {
                node.aid = aid | AID_FLAGS;
            }
        }
        self.send_assoc_resp(NodeKey::Peer(src), reassoc, StatusCode::SUCCESS);
        info!(
            "station {:02x?} {} {}associated",
            src,
            if newly { "newly" } else { "already" },
            if reassoc { "re" } else { "" }
        );
    }

    fn recv_assoc_resp(&mut self, mgmt: &MgmtFrame, fields: &AssocRespFields) {
        if self.config.opmode != OpMode::Sta || self.state != State::Assoc {
            return;
        }
        self.bss.capabilities = fields.capabilities;
        if fields.status != StatusCode::SUCCESS {
            warn!("association with {:02x?} failed, status {}", mgmt.bssid(), fields.status.0);
            if let Some(node) = self.nodes.find_mut(&mgmt.src()) {
                node.fails += 1;
            }
            return;
        }
        self.bss.aid = fields.aid;
        self.bss.rates = fields.rates.clone();
        let _ = fix_rate(
            &mut self.bss.rates,
            &self.info.rates,
            self.config.fixed_rate,
            FixRateFlags::ALL,
        );
        if self.bss.rates.is_empty() {
            debug!("no common rates with {:02x?}", mgmt.bssid());
            return;
        }
        let subtype =
            if fields.reassoc { MgmtSubtype::ReassocResp } else { MgmtSubtype::AssocResp };
        self.new_state(State::Run, Some(Cause::new(subtype, NodeKey::Bss)));
    }

    fn recv_disassoc(&mut self, mgmt: &MgmtFrame, reason: ReasonCode) {
        let src = mgmt.src();
        match self.config.opmode {
            OpMode::Sta => {
                info!("disassociated by {:02x?}, reason {}", src, reason.0);
                self.new_state(State::Assoc, Some(Cause::new(MgmtSubtype::Disassoc, NodeKey::Bss)));
            }
            OpMode::HostAp => {
                if self.nodes.find(&src).is_some() {
                    info!("station {:02x?} disassociated, reason {}", src, reason.0);
                    self.release_aid(&src);
                }
            }
            _ => (),
        }
    }

    fn recv_deauth(&mut self, mgmt: &MgmtFrame, reason: ReasonCode) {
        let src = mgmt.src();
        match self.config.opmode {
            OpMode::Sta => {
                info!("deauthenticated by {:02x?}, reason {}", src, reason.0);
                self.new_state(State::Auth, Some(Cause::new(MgmtSubtype::Deauth, NodeKey::Bss)));
            }
            OpMode::HostAp => {
                if self.nodes.find(&src).is_some() {
                    info!("station {:02x?} deauthenticated, reason {}", src, reason.0);
                    self.free_node(&src);
                }
            }
            _ => (),
        }
    }
}
