// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    crate::{config::MAX_AID, ps::PsQueue},
    std::collections::HashMap,
    wlan_common::mac::{CapabilityInfo, MacAddr, ZERO_ADDR},
};

/// Association ids are sent with the two most significant bits set.
pub const AID_FLAGS: u16 = 0xc000;

pub fn aid_value(aid: u16) -> u16 {
    aid & !AID_FLAGS
}

/// A peer station, or in station mode the BSS being joined.
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub addr: MacAddr,
    pub bssid: MacAddr,
    pub ssid: Vec<u8>,
    /// Rates in 500 kb/s units, basic rates marked with 0x80.
    pub rates: Vec<u8>,
    /// Index into `rates` used for transmission.
    pub txrate: usize,
    pub chan: u8,
    pub rssi: i8,
    /// Local time of the last frame received from this node.
    pub rstamp: u64,
    /// Timestamp carried by the last beacon or probe response.
    pub tstamp: u64,
    pub beacon_interval: u16,
    pub capabilities: CapabilityInfo,
    /// 0 when not associated, otherwise the id with `AID_FLAGS` set.
    pub aid: u16,
    pub fails: u32,
    pub inact: u32,
    pub rx_seq: u16,
    pub tx_seq: u16,
    pub power_save: bool,
    pub ps_queue: PsQueue,
    /// Driver data attached to the node.
    pub private: Vec<u8>,
}

impl Node {
    pub fn new(addr: MacAddr) -> Self {
        Self { addr, ..Default::default() }
    }

    /// Copies `other` into this node. Driver data and queued frames stay with this node.
    pub fn copy_from(&mut self, other: &Node) {
        let private = std::mem::take(&mut self.private);
        let ps_queue = std::mem::take(&mut self.ps_queue);
        *self = other.clone();
        self.private = private;
        self.ps_queue = ps_queue;
    }

    /// Transmit rate in 500 kb/s units, or 0 if the node has no rates.
    pub fn current_rate(&self) -> u8 {
        self.rates.get(self.txrate).map(|rate| rate & crate::rates::RATE_VAL).unwrap_or(0)
    }

    pub fn next_tx_seq(&mut self) -> u16 {
        let seq = self.tx_seq;
        self.tx_seq = (self.tx_seq + 1) & wlan_common::mac::MAX_SEQ_NUM;
        seq
    }

    pub fn is_associated(&self) -> bool {
        self.aid != 0
    }
}

/// Peers known to the MLME, kept in insertion order.
#[derive(Debug)]
pub struct NodeTable {
    nodes: HashMap<MacAddr, Node>,
    order: Vec<MacAddr>,
    aids: Vec<u32>,
}

impl Default for NodeTable {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            order: vec![],
            aids: vec![0; (MAX_AID as usize + 1 + 31) / 32],
        }
    }
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn find(&self, addr: &MacAddr) -> Option<&Node> {
        self.nodes.get(addr)
    }

    pub fn find_mut(&mut self, addr: &MacAddr) -> Option<&mut Node> {
        self.nodes.get_mut(addr)
    }

    /// Adds a node for `addr`, copied from `template` if given. An existing node for the
    /// same address is replaced in place.
    pub fn alloc(&mut self, addr: MacAddr, template: Option<&Node>) -> &mut Node {
        let mut node = Node::new(addr);
        if let Some(template) = template {
            node.copy_from(template);
            node.addr = addr;
        }
        if self.nodes.contains_key(&addr) {
            self.free(&addr);
        }
        self.order.push(addr);
        self.nodes.entry(addr).or_insert(node)
    }

    /// Removes the node for `addr` and releases its association id.
    pub fn free(&mut self, addr: &MacAddr) -> Option<Node> {
        let node = self.nodes.remove(addr)?;
        self.order.retain(|a| a != addr);
        if node.aid != 0 {
            self.clear_aid(node.aid);
        }
        Some(node)
    }

    /// Removes every node, returning them in insertion order.
    pub fn free_all(&mut self) -> Vec<Node> {
        let order = std::mem::take(&mut self.order);
        let freed = order.iter().filter_map(|addr| self.nodes.remove(addr)).collect();
        for word in self.aids.iter_mut() {
            *word = 0;
        }
        freed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        let nodes = &self.nodes;
        self.order.iter().filter_map(move |addr| nodes.get(addr))
    }

    /// Addresses of all nodes in insertion order.
    pub fn addrs(&self) -> Vec<MacAddr> {
        self.order.clone()
    }

    /// Marks and returns the lowest free association id in `1..=max_aid`. The returned id does
    /// not carry `AID_FLAGS`.
    pub fn alloc_aid(&mut self, max_aid: u16) -> Option<u16> {
        let max_aid = max_aid.min(MAX_AID);
        let aid = (1..=max_aid).find(|aid| !self.aid_in_use(*aid))?;
        self.aids[aid as usize / 32] |= 1u32 << (aid % 32);
        Some(aid)
    }

    pub fn clear_aid(&mut self, aid: u16) {
        let aid = aid_value(aid);
        if aid <= MAX_AID {
            self.aids[aid as usize / 32] &= !(1u32 << (aid % 32));
        }
    }

    pub fn aid_in_use(&self, aid: u16) -> bool {
        let aid = aid_value(aid);
        aid <= MAX_AID && self.aids[aid as usize / 32] & (1u32 << (aid % 32)) != 0
    }
}

/// The node the MLME represents itself with, or in station mode the BSS it tracks. Never
/// stored in a `NodeTable`.
pub fn self_node() -> Node {
    Node::new(ZERO_ADDR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(i: usize) -> MacAddr {
        [2, 0, 0, 0, (i >> 8) as u8, i as u8]
    }

    #[test]
    fn alloc_find_free() {
        let mut table = NodeTable::new();
        for i in 0..100 {
            table.alloc(addr(i), None).rssi = i as i8;
        }
        assert_eq!(table.len(), 100);
        for i in (0..100).step_by(2) {
            assert!(table.free(&addr(i)).is_some());
        }
        assert_eq!(table.len(), 50);
        for i in 0..100 {
            match table.find(&addr(i)) {
                Some(node) => {
                    assert_eq!(i % 2, 1);
                    assert_eq!(node.rssi, i as i8);
                }
                None => assert_eq!(i % 2, 0),
            }
        }
        let order = table.iter().map(|node| node.addr).collect::<Vec<_>>();
        assert_eq!(order, (1..100).step_by(2).map(addr).collect::<Vec<_>>());
        assert_eq!(table.addrs(), order);
    }

    #[test]
    fn free_all() {
        let mut table = NodeTable::new();
        let bss = self_node();
        table.alloc(addr(1), Some(&bss));
        table.alloc(addr(2), None);
        let freed = table.free_all();
        assert_eq!(freed.iter().map(|n| n.addr).collect::<Vec<_>>(), vec![addr(1), addr(2)]);
        assert!(table.is_empty());
        assert!(table.find(&addr(1)).is_none());
        assert!(table.free(&addr(1)).is_none());
    }

    #[test]
    fn alloc_copies_template() {
        let mut table = NodeTable::new();
        let mut bss = self_node();
        bss.ssid = b"foo".to_vec();
        bss.rates = vec![0x82, 0x84];
        bss.private = vec![7];
        bss.ps_queue.enqueue(vec![1, 2, 3]);
        let node = table.alloc(addr(3), Some(&bss));
        assert_eq!(node.addr, addr(3));
        assert_eq!(&node.ssid[..], b"foo");
        assert_eq!(node.rates, vec![0x82, 0x84]);
        assert!(node.private.is_empty());
        assert!(node.ps_queue.is_empty());
    }

    #[test]
    fn alloc_replaces_existing() {
        let mut table = NodeTable::new();
        table.alloc(addr(1), None).rssi = 10;
        table.alloc(addr(2), None);
        table.alloc(addr(1), None);
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(&addr(1)).map(|n| n.rssi), Some(0));
        assert_eq!(table.addrs(), vec![addr(2), addr(1)]);
    }

    #[test]
    fn copy_from_keeps_private_data() {
        let mut bss = self_node();
        bss.private = vec![1, 2];
        let mut winner = Node::new(addr(9));
        winner.bssid = addr(9);
        winner.private = vec![3];
        bss.copy_from(&winner);
        assert_eq!(bss.addr, addr(9));
        assert_eq!(bss.private, vec![1, 2]);
    }

    #[test]
    fn aid_allocation() {
        let mut table = NodeTable::new();
        assert_eq!(table.alloc_aid(3), Some(1));
        assert_eq!(table.alloc_aid(3), Some(2));
        assert_eq!(table.alloc_aid(3), Some(3));
        assert_eq!(table.alloc_aid(3), None);
        table.clear_aid(2 | AID_FLAGS);
        assert!(!table.aid_in_use(2));
        assert_eq!(table.alloc_aid(3), Some(2));
        assert_eq!(table.alloc_aid(MAX_AID), Some(4));
    }

    #[test]
    fn free_releases_aid() {
        let mut table = NodeTable::new();
        let aid = table.alloc_aid(MAX_AID).expect("no aid");
        table.alloc(addr(1), None).aid = aid | AID_FLAGS;
        assert!(table.aid_in_use(aid));
        table.free(&addr(1));
        assert!(!table.aid_in_use(aid));
    }

    #[test]
    fn tx_seq_wraps() {
        let mut node = Node::new(addr(1));
        node.tx_seq = 0x0fff;
        assert_eq!(node.next_tx_seq(), 0x0fff);
        assert_eq!(node.next_tx_seq(), 0);
    }
}
