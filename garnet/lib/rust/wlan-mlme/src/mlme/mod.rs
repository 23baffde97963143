// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

mod control;
mod data;
mod recv;
mod scan;
mod state;

pub use {scan::MatchFailures, state::State};

use {
    crate::{
        channel::{ChannelSet, Channels},
        config::{DeviceInfo, MlmeConfig, OpMode, MAX_AID},
        device::{DeviceOps, LinkStatus},
        error::Error,
        node::{aid_value, Node, NodeTable},
        rates::{RATE_SIZE, RATE_VAL},
        timer::{EventId, Scheduler, Timer},
        wep::{KeySlots, WepEngine},
    },
    log::{debug, error, warn},
    std::{collections::VecDeque, time::Duration},
    wlan_common::{
        ie::{Tim, SSID_MAX_LEN},
        mac::{
            AuthAlgorithmNumber, CapabilityInfo, MacAddr, ReasonCode, StatusCode, BCAST_ADDR,
        },
        mgmt::{
            encode_management, AssocReqFields, AssocRespFields, AuthFields, BssFields, MgmtBody,
            ProbeReqFields,
        },
        mgmt_writer::MgmtHdrFields,
    },
};

/// Time allowed for a peer to answer a management frame.
pub const TRANS_WAIT: Duration = Duration::from_secs(5);
/// Period of the inactivity sweep over the node table.
pub const INACT_WAIT: Duration = Duration::from_secs(5);
/// Sweeps without traffic before a node is deauthenticated.
pub const INACT_MAX: u32 = 60;
/// Time spent listening on each channel while scanning.
pub const SCAN_DWELL: Duration = Duration::from_millis(200);
/// Ethernet frames held while the link is not up.
pub const TX_QUEUE_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimedEvent {
    MgmtTimeout,
    InactivitySweep,
    ScanDwell,
}

/// Identifies the node a frame is exchanged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKey {
    /// The MLME's own BSS node.
    Bss,
    Peer(MacAddr),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_queue_overflows: u64,
}

pub struct Mlme<D> {
    device: D,
    timer: Timer<TimedEvent>,
    config: MlmeConfig,
    info: DeviceInfo,
    chans: Channels,
    state: State,
    bss: Node,
    nodes: NodeTable,
    wep: WepEngine,
    keys: KeySlots,
    active_scan: bool,
    ibss_synced: bool,
    mgmt_timeout: Option<EventId>,
    inact_timeout: Option<EventId>,
    scan_timeout: Option<EventId>,
    tx_queue: VecDeque<Vec<u8>>,
    stats: Stats,
}

impl<D: DeviceOps> Mlme<D> {
    pub fn new(
        device: D,
        info: DeviceInfo,
        config: MlmeConfig,
        scheduler: Box<dyn Scheduler>,
    ) -> Result<Self, Error> {
        if info.rates.is_empty() || info.rates.len() > RATE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "device must support 1 to {} rates, got {}",
                RATE_SIZE,
                info.rates.len()
            )));
        }
        if !info.caps.supports(config.opmode) {
            return Err(Error::NotSupported(format!("{:?} mode", config.opmode)));
        }
        if config.ssid.len() > SSID_MAX_LEN {
            return Err(Error::InvalidArgument(format!("SSID too long: {}", config.ssid.len())));
        }
        if config.max_aid == 0 || config.max_aid > MAX_AID {
            return Err(Error::InvalidArgument(format!("invalid max aid {}", config.max_aid)));
        }
        if let Some(rate) = config.fixed_rate {
            if !info.rates.iter().any(|r| r & RATE_VAL == rate & RATE_VAL) {
                return Err(Error::InvalidArgument(format!("unsupported fixed rate {}", rate)));
            }
        }
        if config.wep_enabled && !info.caps.wep {
            return Err(Error::NotSupported("WEP".to_string()));
        }
        let available = info.channels.iter().copied().collect::<ChannelSet>();
        if available.is_empty() {
            return Err(Error::InvalidArgument("device reports no channels".to_string()));
        }
        Ok(Self {
            device,
            timer: Timer::new(scheduler),
            config,
            info,
            chans: Channels::new(available),
            state: State::Init,
            bss: crate::node::self_node(),
            nodes: NodeTable::new(),
            wep: WepEngine::new(),
            keys: KeySlots::new(),
            active_scan: false,
            ibss_synced: false,
            mgmt_timeout: None,
            inact_timeout: None,
            scan_timeout: None,
            tx_queue: VecDeque::new(),
            stats: Stats::default(),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The node describing the BSS this MLME is part of.
    pub fn bss(&self) -> &Node {
        &self.bss
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn config(&self) -> &MlmeConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// True once an IBSS or BSS has been created locally.
    pub fn is_ibss_creator(&self) -> bool {
        self.ibss_synced
    }

    pub fn start(&mut self) {
        if self.state != State::Init {
            debug!("ignoring start in state {:?}", self.state);
            return;
        }
        match self.config.opmode {
            OpMode::Sta | OpMode::Ibss => self.new_state(State::Scan, None),
            OpMode::HostAp | OpMode::AhDemo => {
                self.state = State::Scan;
                self.reset_bss();
                self.create_ibss();
            }
            OpMode::Monitor => {
                let chan = self.config.channel.unwrap_or(self.config.ibss_channel);
                self.bss.chan = chan;
                self.tune(chan);
                self.state = State::Run;
                self.device.set_link_status(LinkStatus::UP);
            }
        }
    }

    pub fn stop(&mut self) {
        self.new_state(State::Init, None);
        self.timer.cancel_all();
        self.mgmt_timeout = None;
        self.inact_timeout = None;
        self.scan_timeout = None;
    }

    pub fn reset(&mut self) {
        self.stop();
        self.start();
    }

    pub fn handle_timeout(&mut self, event_id: EventId) {
        match self.timer.triggered(&event_id) {
            Some(TimedEvent::MgmtTimeout) => {
                self.mgmt_timeout = None;
                debug!("management frame timed out in state {:?}", self.state);
                self.new_state(State::Scan, None);
            }
            Some(TimedEvent::InactivitySweep) => {
                self.inact_timeout = None;
                self.sweep_inactive();
            }
            Some(TimedEvent::ScanDwell) => {
                self.scan_timeout = None;
                if self.state == State::Scan {
                    self.next_scan();
                }
            }
            None => debug!("ignoring stale timeout {:?}", event_id),
        }
    }

    fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        match key {
            NodeKey::Bss => Some(&mut self.bss),
            NodeKey::Peer(addr) => self.nodes.find_mut(&addr),
        }
    }

    fn my_addr(&self) -> MacAddr {
        self.info.addr
    }

    fn tune(&mut self, chan: u8) {
        self.chans.current = chan;
        if let Err(e) = self.device.set_channel(chan) {
            warn!("failed to tune to channel {}: {}", chan, e);
        }
    }

    /// Prepares the BSS node for probing: broadcast addresses and all local rates.
    fn reset_bss(&mut self) {
        self.bss.addr = BCAST_ADDR;
        self.bss.bssid = BCAST_ADDR;
        self.bss.rates = self.info.rates.clone();
        self.bss.aid = 0;
        self.bss.rstamp = 0;
    }

    fn schedule(&mut self, after: Duration, event: TimedEvent) -> EventId {
        self.timer.schedule_event(after, event)
    }

    fn arm_mgmt_timer(&mut self) {
        self.cancel_mgmt_timer();
        self.mgmt_timeout = Some(self.schedule(TRANS_WAIT, TimedEvent::MgmtTimeout));
    }

    fn cancel_mgmt_timer(&mut self) {
        if let Some(id) = self.mgmt_timeout.take() {
            self.timer.cancel_event(id);
        }
    }

    fn arm_inact_timer(&mut self) {
        self.cancel_inact_timer();
        self.inact_timeout = Some(self.schedule(INACT_WAIT, TimedEvent::InactivitySweep));
    }

    fn cancel_inact_timer(&mut self) {
        if let Some(id) = self.inact_timeout.take() {
            self.timer.cancel_event(id);
        }
    }

    fn arm_scan_timer(&mut self) {
        self.cancel_scan_timer();
        self.scan_timeout = Some(self.schedule(SCAN_DWELL, TimedEvent::ScanDwell));
    }

    fn cancel_scan_timer(&mut self) {
        if let Some(id) = self.scan_timeout.take() {
            self.timer.cancel_event(id);
        }
    }

    /// Adds a node to the table, optionally copied from the BSS node, and restarts the
    /// inactivity sweep.
    fn alloc_node(&mut self, addr: MacAddr, copy_bss: bool) -> &mut Node {
        self.arm_inact_timer();
        let template = if copy_bss { Some(&self.bss) } else { None };
        self.nodes.alloc(addr, template)
    }

    fn free_node(&mut self, addr: &MacAddr) {
        if let Some(mut node) = self.nodes.free(addr) {
            if node.ps_queue.purge() > 0 {
                self.device.set_tim(aid_value(node.aid), false);
            }
        }
        if self.nodes.is_empty() {
            self.cancel_inact_timer();
        }
    }

    fn free_all_nodes(&mut self) {
        for mut node in self.nodes.free_all() {
            if node.ps_queue.purge() > 0 {
                self.device.set_tim(aid_value(node.aid), false);
            }
        }
        self.cancel_inact_timer();
    }

    fn sweep_inactive(&mut self) {
        for addr in self.nodes.addrs() {
            let expired = match self.nodes.find_mut(&addr) {
                Some(node) => {
                    node.inact += 1;
                    node.inact > INACT_MAX
                }
                None => false,
            };
            if expired {
                debug!("station {:02x?} inactive, deauthenticating", addr);
                self.send_deauth(NodeKey::Peer(addr), ReasonCode::INVALID_AUTHENTICATION);
                self.free_node(&addr);
            }
        }
        if !self.nodes.is_empty() {
            self.arm_inact_timer();
        }
    }

    fn send_frame(&mut self, frame: Vec<u8>) {
        match self.device.send_wlan_frame(frame) {
            Ok(()) => self.stats.tx_packets += 1,
            Err(e) => {
                self.stats.tx_errors += 1;
                error!("failed to send frame: {}", e);
            }
        }
    }

    fn send_mgmt(&mut self, key: NodeKey, body: MgmtBody) {
        let my_addr = self.my_addr();
        let chan = self.chans.current;
        let (addr1, addr3, seq) = match self.node_mut(key) {
            Some(node) => {
                node.inact = 0;
                (node.addr, node.bssid, node.next_tx_seq())
            }
            None => {
                warn!("not sending {:?}: unknown node {:?}", body.subtype(), key);
                return;
            }
        };
        let hdr = MgmtHdrFields::new(body.subtype(), addr1, my_addr, addr3, seq);
        let mut buf = vec![];
        if let Err(e) = encode_management(&mut buf, &hdr, &body) {
            self.stats.tx_errors += 1;
            error!("failed to write {:?} frame: {}", body.subtype(), e);
            return;
        }
        debug!("sending {:?} to {:02x?} on channel {}", body.subtype(), addr1, chan);
        self.send_frame(buf);
    }

    /// Capabilities advertised by this station.
    fn local_capabilities(&self) -> CapabilityInfo {
        let mut cap = CapabilityInfo(0);
        if self.config.opmode == OpMode::Ibss || self.config.opmode == OpMode::AhDemo {
            cap.set_ibss(true);
        } else {
            cap.set_ess(true);
        }
        cap.set_privacy(self.config.wep_enabled);
        cap
    }

    fn send_probe_req(&mut self, key: NodeKey) {
        let body = MgmtBody::ProbeReq(ProbeReqFields {
            ssid: self.config.ssid.clone(),
            rates: self.info.rates.clone(),
        });
        self.send_mgmt(key, body);
        self.arm_mgmt_timer();
    }

    fn send_probe_resp(&mut self, key: NodeKey) {
        let ibss = self.config.opmode == OpMode::Ibss;
        let body = MgmtBody::ProbeResp(BssFields {
            timestamp: 0,
            beacon_interval: self.bss.beacon_interval,
            capabilities: self.local_capabilities(),
            ssid: self.bss.ssid.clone(),
            rates: self.bss.rates.clone(),
            dsss_chan: None,
            ibss_atim_window: if ibss { Some(0) } else { None },
            tim: if ibss {
                None
            } else {
                Some(Tim {
                    dtim_count: 0,
                    dtim_period: 1,
                    bmp_ctrl: 0,
                    partial_virtual_bmp: vec![0],
                })
            },
        });
        self.send_mgmt(key, body);
    }

    fn send_auth(&mut self, key: NodeKey, seq: u16) {
        let body = MgmtBody::Auth(AuthFields {
            algorithm: AuthAlgorithmNumber::OPEN,
            seq,
            status: StatusCode::SUCCESS,
        });
        self.send_mgmt(key, body);
        if self.config.opmode == OpMode::Sta {
            self.arm_mgmt_timer();
        }
    }

    fn send_deauth(&mut self, key: NodeKey, reason: ReasonCode) {
        debug!("deauthenticating {:?}, reason {}", key, reason.0);
        self.send_mgmt(key, MgmtBody::Deauth { reason });
    }

    fn send_disassoc(&mut self, key: NodeKey, reason: ReasonCode) {
        debug!("disassociating {:?}, reason {}", key, reason.0);
        self.send_mgmt(key, MgmtBody::Disassoc { reason });
    }

    fn send_assoc_req(&mut self, key: NodeKey, reassoc: bool) {
        let ssid = match self.node_mut(key) {
            Some(node) => node.ssid.clone(),
            None => return,
        };
        let body = MgmtBody::AssocReq(AssocReqFields {
            capabilities: self.local_capabilities(),
            listen_interval: self.config.listen_interval,
            current_ap: if reassoc { Some(self.bss.bssid) } else { None },
            ssid,
            rates: self.info.rates.clone(),
        });
        self.send_mgmt(key, body);
        self.arm_mgmt_timer();
    }

    fn send_assoc_resp(&mut self, key: NodeKey, reassoc: bool, status: StatusCode) {
        let (aid, rates) = match self.node_mut(key) {
            Some(node) => (node.aid, node.rates.clone()),
            None => return,
        };
        let mut capabilities = CapabilityInfo(0);
        capabilities.set_ess(true);
        capabilities.set_privacy(self.config.wep_enabled);
        let body = MgmtBody::AssocResp(AssocRespFields {
            reassoc,
            capabilities,
            status,
            aid: if status == StatusCode::SUCCESS { aid } else { 0 },
            rates,
        });
        self.send_mgmt(key, body);
    }
}
