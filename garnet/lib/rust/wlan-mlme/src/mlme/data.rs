// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    super::{recv::RxHeader, Mlme, NodeKey, State, TX_QUEUE_LIMIT},
    crate::{config::OpMode, device::DeviceOps, error::Busy, node::aid_value},
    byteorder::{ByteOrder, LittleEndian},
    log::{debug, warn},
    wlan_common::{
        data::{decapsulate, encapsulate},
        frame_buf::FrameBuf,
        mac::{is_multicast, DsDirection, EthernetIIHdr, FrameControl, MacAddr, ReasonCode},
    },
    zerocopy::LayoutVerified,
};

fn eth_dst(eth_frame: &[u8]) -> Option<MacAddr> {
    LayoutVerified::<_, EthernetIIHdr>::new_unaligned_from_prefix(eth_frame).map(|(hdr, _)| hdr.da)
}

fn set_more_data(frame: &mut [u8]) {
    if frame.len() >= 2 {
        let mut fc = FrameControl(LittleEndian::read_u16(&frame[0..2]));
        fc.set_more_data(true);
        LittleEndian::write_u16(&mut frame[0..2], fc.0);
    }
}

impl<D: DeviceOps> Mlme<D> {
    pub(crate) fn recv_data(&mut self, frame: &[u8], hdr: &RxHeader, key: NodeKey) {
        let direction = hdr.frame_ctrl.direction();
        match self.config.opmode {
            OpMode::Sta => {
                if direction != DsDirection::FromDs {
                    debug!("dropping data frame with direction {:?}", direction);
                    return;
                }
                if is_multicast(&hdr.addr1) && hdr.addr3 == Some(self.my_addr()) {
                    // Our own multicast frame relayed by the AP.
                    return;
                }
            }
            OpMode::Ibss | OpMode::AhDemo => {
                if direction != DsDirection::NoDs {
                    debug!("dropping data frame with direction {:?}", direction);
                    return;
                }
            }
            OpMode::HostAp => {
                if direction != DsDirection::ToDs {
                    debug!("dropping data frame with direction {:?}", direction);
                    return;
                }
                let src = hdr.addr2;
                match key {
                    NodeKey::Bss => {
                        debug!("data frame from unauthenticated station {:02x?}", src);
                        self.alloc_node(src, true);
                        self.send_deauth(NodeKey::Peer(src), ReasonCode::INVALID_CLASS2FRAME);
                        self.free_node(&src);
                        self.stats.rx_errors += 1;
                        return;
                    }
                    NodeKey::Peer(addr) => {
                        if self.nodes.find(&addr).map_or(true, |node| !node.is_associated()) {
                            debug!("data frame from unassociated station {:02x?}", addr);
                            self.send_disassoc(key, ReasonCode::INVALID_CLASS3FRAME);
                            self.stats.rx_errors += 1;
                            return;
                        }
                    }
                }
            }
            OpMode::Monitor => return,
        }

        let plain = if hdr.frame_ctrl.protected() {
            if !self.config.wep_enabled {
                debug!("dropping protected frame, WEP is off");
                return;
            }
            match self.wep.decrypt_mpdu(&self.keys, &mut FrameBuf::from(frame)) {
                Ok(plain) => plain,
                Err(e) => {
                    debug!("dropping frame from {:02x?}: {}", hdr.addr2, e);
                    self.stats.rx_errors += 1;
                    return;
                }
            }
        } else {
            frame.to_vec()
        };
        let mut eth_frame = vec![];
        if let Err(e) = decapsulate(&mut eth_frame, &plain[..]) {
            debug!("dropping data frame: {}", e);
            self.stats.rx_errors += 1;
            return;
        }
        self.stats.rx_packets += 1;

        if self.config.opmode == OpMode::HostAp {
            let dst = match eth_dst(&eth_frame) {
                Some(dst) => dst,
                None => return,
            };
            if is_multicast(&dst) {
                self.send_eth(&eth_frame);
            } else if self.nodes.find(&dst).map_or(false, |node| node.is_associated()) {
                self.send_eth(&eth_frame);
                return;
            }
        }
        if let Err(e) = self.device.deliver_eth_frame(&eth_frame) {
            warn!("failed to deliver frame: {}", e);
        }
    }

    /// Sends an Ethernet frame on the link, or holds it until the link is up.
    pub fn transmit(&mut self, eth_frame: &[u8]) -> Result<(), Busy> {
        if self.state != State::Run {
            if self.tx_queue.len() >= TX_QUEUE_LIMIT {
                self.stats.tx_queue_overflows += 1;
                return Err(Busy);
            }
            self.tx_queue.push_back(eth_frame.to_vec());
            return Ok(());
        }
        self.send_eth(eth_frame);
        Ok(())
    }

    pub(crate) fn flush_tx_queue(&mut self) {
        while let Some(eth_frame) = self.tx_queue.pop_front() {
            self.send_eth(&eth_frame);
        }
    }

    fn send_eth(&mut self, eth_frame: &[u8]) {
        let dst = match eth_dst(eth_frame) {
            Some(dst) => dst,
            None => {
                self.stats.tx_errors += 1;
                return;
            }
        };
        let opmode = self.config.opmode;
        let direction = match opmode {
            OpMode::Sta => DsDirection::ToDs,
            OpMode::Ibss | OpMode::AhDemo => DsDirection::NoDs,
            OpMode::HostAp => DsDirection::FromDs,
            OpMode::Monitor => {
                debug!("cannot transmit in monitor mode");
                self.stats.tx_errors += 1;
                return;
            }
        };
        let key = if !is_multicast(&dst)
            && (opmode == OpMode::Ibss || opmode == OpMode::HostAp)
            && self.nodes.find(&dst).is_some()
        {
            NodeKey::Peer(dst)
        } else {
            NodeKey::Bss
        };
        let (bssid, seq_num, dozing) = match self.node_mut(key) {
            Some(node) => {
                node.inact = 0;
                (node.bssid, node.next_tx_seq(), node.power_save)
            }
            None => return,
        };

        let mut frame = vec![];
        if let Err(e) = encapsulate(&mut frame, eth_frame, direction, bssid, seq_num) {
            warn!("failed to encapsulate frame: {}", e);
            self.stats.tx_errors += 1;
            return;
        }
        if self.config.wep_enabled {
            let kid = self.config.wep_tx_key;
            frame = match self.wep.encrypt_mpdu(&self.keys, kid, &mut FrameBuf::from(frame)) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("failed to encrypt frame: {}", e);
                    self.stats.tx_errors += 1;
                    return;
                }
            };
        }

        match key {
            NodeKey::Peer(addr)
                if opmode == OpMode::HostAp
                    && dozing
                    && !self.info.caps.power_save_buffering =>
            {
                self.enqueue_power_save(addr, frame)
            }
            _ => self.send_frame(frame),
        }
    }

    fn enqueue_power_save(&mut self, addr: MacAddr, frame: Vec<u8>) {
        let (aid, was_empty, queued, drops) = match self.nodes.find_mut(&addr) {
            Some(node) => {
                let was_empty = node.ps_queue.is_empty();
                let queued = node.ps_queue.enqueue(frame);
                (node.aid, was_empty, queued, node.ps_queue.drops())
            }
            None => return,
        };
        if !queued {
            debug!("power save queue full for {:02x?}, {} dropped", addr, drops);
            return;
        }
        if was_empty {
            self.device.set_tim(aid_value(aid), true);
        }
    }

    pub(crate) fn recv_ps_poll(&mut self, ta: MacAddr, aid: u16) {
        let (mut frame, node_aid, remaining) = match self.nodes.find_mut(&ta) {
            Some(node) => {
                if aid & crate::node::AID_FLAGS != crate::node::AID_FLAGS || aid != node.aid {
                    debug!("ps-poll from {:02x?} with wrong aid {:#x}", ta, aid);
                    return;
                }
                match node.ps_queue.dequeue() {
                    Some(frame) => (frame, node.aid, node.ps_queue.len()),
                    None => {
                        debug!("ps-poll from {:02x?} with nothing queued", ta);
                        return;
                    }
                }
            }
            None => {
                debug!("ps-poll from unknown station {:02x?}", ta);
                return;
            }
        };
        if remaining == 0 {
            self.device.set_tim(aid_value(node_aid), false);
        } else {
            set_more_data(&mut frame[..]);
        }
        self.send_frame(frame);
    }

    /// Tracks the power management bit of frames from `addr`. Waking up flushes the frames
    /// held for the station.
    pub(crate) fn update_power_save(&mut self, addr: MacAddr, power_mgmt: bool) {
        if self.config.opmode != OpMode::HostAp || self.info.caps.power_save_buffering {
            return;
        }
        let node = match self.nodes.find_mut(&addr) {
            Some(node) => node,
            None => return,
        };
        if power_mgmt == node.power_save {
            return;
        }
        node.power_save = power_mgmt;
        if power_mgmt {
            debug!("station {:02x?} entered power save", addr);
            return;
        }
        let aid = node.aid;
        let frames: Vec<_> = node.ps_queue.drain().collect();
        debug!("station {:02x?} left power save, flushing {} frames", addr, frames.len());
        self.device.set_tim(aid_value(aid), false);
        for frame in frames {
            self.send_frame(frame);
        }
    }
}
