// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! WEP encapsulation, IEEE Std 802.11-2016, 12.3.2.
//!
//! An encrypted body is laid out as `IV (3 bytes, little endian) | key id << 6 | RC4(data |
//! ICV)` where the ICV is the CRC-32 of the data and the RC4 seed is `IV | key`.

use {
    byteorder::{ByteOrder, LittleEndian},
    thiserror::Error,
    wlan_common::{
        frame_buf::FrameBuf,
        mac::{FrameControl, MacHdr},
    },
};

pub const WEP_NKID: usize = 4;
pub const WEP_KEY_MIN_LEN: usize = 5;
pub const WEP_KEY_MAX_LEN: usize = 16;
pub const WEP_IV_LEN: usize = 3;
pub const WEP_KID_LEN: usize = 1;
pub const WEP_CRC_LEN: usize = 4;
pub const WEP_HDR_LEN: usize = WEP_IV_LEN + WEP_KID_LEN;
/// Bytes added to a body by encryption.
pub const WEP_OVERHEAD: usize = WEP_HDR_LEN + WEP_CRC_LEN;

const IV_MASK: u32 = 0x00ff_ffff;
const MAC_HDR_LEN: usize = std::mem::size_of::<MacHdr>();

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WepError {
    #[error("invalid key length: {0}")]
    InvalidKeyLength(usize),
    #[error("invalid key index: {0}")]
    InvalidKeyIndex(usize),
    #[error("no key in slot {0}")]
    EmptyKey(usize),
    #[error("frame too short to be encrypted: {0} bytes")]
    FrameTooShort(usize),
    #[error("integrity check failed")]
    IntegrityCheckFailed,
}

/// The four default keys. An empty slot holds no key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeySlots {
    keys: [Vec<u8>; WEP_NKID],
}

impl KeySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key` in slot `kid`. An empty key clears the slot.
    pub fn set(&mut self, kid: usize, key: &[u8]) -> Result<(), WepError> {
        if kid >= WEP_NKID {
            return Err(WepError::InvalidKeyIndex(kid));
        }
        if !key.is_empty() && !(WEP_KEY_MIN_LEN..=WEP_KEY_MAX_LEN).contains(&key.len()) {
            return Err(WepError::InvalidKeyLength(key.len()));
        }
        self.keys[kid] = key.to_vec();
        Ok(())
    }

    pub fn get(&self, kid: usize) -> Result<&[u8], WepError> {
        match self.keys.get(kid) {
            None => Err(WepError::InvalidKeyIndex(kid)),
            Some(key) if key.is_empty() => Err(WepError::EmptyKey(kid)),
            Some(key) => Ok(&key[..]),
        }
    }

    pub fn is_set(&self, kid: usize) -> bool {
        self.get(kid).is_ok()
    }
}

impl std::fmt::Debug for KeySlots {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list().entries(self.keys.iter().map(|key| key.len())).finish()
    }
}

/// Table driven CRC-32, RFC 2083.
struct Crc32 {
    table: [u32; 256],
}

impl Crc32 {
    fn new() -> Self {
        let mut table = [0u32; 256];
        for (n, entry) in table.iter_mut().enumerate() {
            let mut c = n as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 { 0xedb8_8320 ^ (c >> 1) } else { c >> 1 };
            }
            *entry = c;
        }
        Self { table }
    }

    /// Updates a running CRC. Start with all ones and complement the result.
    fn update(&self, crc: u32, bytes: &[u8]) -> u32 {
        bytes.iter().fold(crc, |crc, b| {
            self.table[((crc ^ *b as u32) & 0xff) as usize] ^ (crc >> 8)
        })
    }
}

struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (i, v) in s.iter_mut().enumerate() {
            *v = i as u8;
        }
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }
        Self { s, i: 0, j: 0 }
    }

    fn apply(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.s[self.i as usize]);
            self.s.swap(self.i as usize, self.j as usize);
            let k = self.s[self.s[self.i as usize].wrapping_add(self.s[self.j as usize]) as usize];
            *byte ^= k;
        }
    }
}

fn cipher(iv: &[u8], key: &[u8]) -> Rc4 {
    let mut seed = Vec::with_capacity(WEP_IV_LEN + key.len());
    seed.extend_from_slice(&iv[..WEP_IV_LEN]);
    seed.extend_from_slice(key);
    Rc4::new(&seed[..])
}

/// IVs of the form (B, 255, N) with 3 <= B < 8 leak key bytes.
pub fn is_weak_iv(iv: u32) -> bool {
    iv >= 0x03ff00 && (iv & 0xf8ff00) == 0x00ff00
}

fn set_protected(hdr: &mut [u8], protected: bool) {
    let mut fc = FrameControl(LittleEndian::read_u16(&hdr[0..2]));
    fc.set_protected(protected);
    LittleEndian::write_u16(&mut hdr[0..2], fc.0);
}

pub struct WepEngine {
    crc: Crc32,
    next_iv: Option<u32>,
}

impl Default for WepEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WepEngine {
    /// The first IV is drawn at random.
    pub fn new() -> Self {
        Self { crc: Crc32::new(), next_iv: None }
    }

    pub fn with_iv(iv: u32) -> Self {
        Self { crc: Crc32::new(), next_iv: Some(iv & IV_MASK) }
    }

    pub fn next_iv(&mut self) -> u32 {
        let mut iv = self.next_iv.unwrap_or_else(|| rand::random::<u32>() & IV_MASK);
        if is_weak_iv(iv) {
            iv += 0x100;
        }
        self.next_iv = Some((iv + 1) & IV_MASK);
        iv
    }

    fn icv(&self, data: &[u8]) -> u32 {
        !self.crc.update(!0, data)
    }

    fn encrypt_from(
        &mut self,
        keys: &KeySlots,
        kid: usize,
        frame: &FrameBuf,
        offset: usize,
    ) -> Result<Vec<u8>, WepError> {
        let key = keys.get(kid)?;
        let iv = self.next_iv();
        let mut out = Vec::with_capacity(frame.len().saturating_sub(offset) + WEP_OVERHEAD);
        let mut iv_bytes = [0u8; 4];
        LittleEndian::write_u32(&mut iv_bytes, iv);
        out.extend_from_slice(&iv_bytes[..WEP_IV_LEN]);
        out.push((kid as u8) << 6);

        let mut rc4 = cipher(&iv_bytes, key);
        let mut crc = !0;
        for chunk in frame.chunks_from(offset) {
            crc = self.crc.update(crc, chunk);
            let start = out.len();
            out.extend_from_slice(chunk);
            rc4.apply(&mut out[start..]);
        }
        let mut icv = [0u8; WEP_CRC_LEN];
        LittleEndian::write_u32(&mut icv, !crc);
        rc4.apply(&mut icv);
        out.extend_from_slice(&icv);
        Ok(out)
    }

    fn decrypt_from(
        &self,
        keys: &KeySlots,
        frame: &mut FrameBuf,
        offset: usize,
    ) -> Result<Vec<u8>, WepError> {
        let total = frame.len();
        let body_len = total
            .checked_sub(offset + WEP_OVERHEAD)
            .ok_or(WepError::FrameTooShort(total))?;
        let mut hdr = [0u8; WEP_HDR_LEN];
        match frame.pullup(offset + WEP_HDR_LEN) {
            Some(bytes) => hdr.copy_from_slice(&bytes[offset..]),
            None => return Err(WepError::FrameTooShort(total)),
        }
        let kid = (hdr[WEP_IV_LEN] >> 6) as usize;
        let key = keys.get(kid)?;

        let mut rc4 = cipher(&hdr, key);
        let mut plaintext = Vec::with_capacity(body_len);
        let mut icv = Vec::with_capacity(WEP_CRC_LEN);
        for chunk in frame.chunks_from(offset + WEP_HDR_LEN) {
            let take = (body_len - plaintext.len()).min(chunk.len());
            let start = plaintext.len();
            plaintext.extend_from_slice(&chunk[..take]);
            rc4.apply(&mut plaintext[start..]);
            let start = icv.len();
            icv.extend_from_slice(&chunk[take..]);
            rc4.apply(&mut icv[start..]);
        }
        if LittleEndian::read_u32(&icv[..]) != self.icv(&plaintext[..]) {
            return Err(WepError::IntegrityCheckFailed);
        }
        Ok(plaintext)
    }

    /// Encrypts `plaintext` with key `kid` and the next IV.
    pub fn encrypt(
        &mut self,
        keys: &KeySlots,
        kid: usize,
        plaintext: &FrameBuf,
    ) -> Result<Vec<u8>, WepError> {
        self.encrypt_from(keys, kid, plaintext, 0)
    }

    /// Decrypts a body produced by `encrypt`, using the key id it carries.
    pub fn decrypt(
        &self,
        keys: &KeySlots,
        ciphertext: &mut FrameBuf,
    ) -> Result<Vec<u8>, WepError> {
        self.decrypt_from(keys, ciphertext, 0)
    }

    /// Encrypts the body of an 802.11 frame and marks it protected.
    pub fn encrypt_mpdu(
        &mut self,
        keys: &KeySlots,
        kid: usize,
        frame: &mut FrameBuf,
    ) -> Result<Vec<u8>, WepError> {
        let mut out = match frame.pullup(MAC_HDR_LEN) {
            Some(hdr) => hdr.to_vec(),
            None => return Err(WepError::FrameTooShort(frame.len())),
        };
        set_protected(&mut out[..], true);
        let body = self.encrypt_from(keys, kid, frame, MAC_HDR_LEN)?;
        out.extend_from_slice(&body[..]);
        Ok(out)
    }

    /// Decrypts the body of a protected 802.11 frame and clears the protected bit.
    pub fn decrypt_mpdu(
        &self,
        keys: &KeySlots,
        frame: &mut FrameBuf,
    ) -> Result<Vec<u8>, WepError> {
        let plaintext = self.decrypt_from(keys, frame, MAC_HDR_LEN)?;
        let mut out = match frame.pullup(MAC_HDR_LEN) {
            Some(hdr) => hdr.to_vec(),
            None => return Err(WepError::FrameTooShort(frame.len())),
        };
        set_protected(&mut out[..], false);
        out.extend_from_slice(&plaintext[..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    fn keys_with(kid: usize, len: usize) -> KeySlots {
        let mut keys = KeySlots::new();
        let key = (0..len).map(|i| (i * 7 + 1) as u8).collect::<Vec<_>>();
        keys.set(kid, &key[..]).expect("setting key");
        keys
    }

    fn payload() -> Vec<u8> {
        (0..100u8).collect()
    }

    #[test]
    fn crc32_check_value() {
        let crc = Crc32::new();
        assert_eq!(!crc.update(!0, b"123456789"), 0xcbf4_3926);
    }

    #[test]
    fn rc4_known_answer() {
        let mut data = b"Plaintext".to_vec();
        Rc4::new(b"Key").apply(&mut data[..]);
        assert_eq!(data, vec![0xbb, 0xf3, 0x16, 0xe8, 0xd9, 0x40, 0xaf, 0x0a, 0xd3]);
    }

    #[test]
    fn key_slots() {
        let mut keys = KeySlots::new();
        assert_eq!(keys.set(0, &[1; 4]), Err(WepError::InvalidKeyLength(4)));
        assert_eq!(keys.set(0, &[1; 17]), Err(WepError::InvalidKeyLength(17)));
        assert_eq!(keys.set(4, &[1; 5]), Err(WepError::InvalidKeyIndex(4)));
        assert_eq!(keys.get(1), Err(WepError::EmptyKey(1)));
        keys.set(1, &[1; 13]).expect("setting key");
        assert_eq!(keys.get(1), Ok(&[1u8; 13][..]));
        keys.set(1, &[]).expect("clearing key");
        assert!(!keys.is_set(1));
    }

    #[test_case(5)]
    #[test_case(6)]
    #[test_case(7)]
    #[test_case(8)]
    #[test_case(9)]
    #[test_case(10)]
    #[test_case(11)]
    #[test_case(12)]
    #[test_case(13)]
    #[test_case(14)]
    #[test_case(15)]
    #[test_case(16)]
    fn round_trip(key_len: usize) {
        let keys = keys_with(2, key_len);
        let mut engine = WepEngine::with_iv(0x010203);
        let ciphertext = engine.encrypt(&keys, 2, &FrameBuf::from(payload())).expect("encrypt");
        assert_eq!(ciphertext.len(), payload().len() + WEP_OVERHEAD);
        assert_eq!(&ciphertext[..4], &[0x03, 0x02, 0x01, 2 << 6]);
        assert_ne!(&ciphertext[4..104], &payload()[..]);

        let plaintext = engine.decrypt(&keys, &mut FrameBuf::from(ciphertext)).expect("decrypt");
        assert_eq!(plaintext, payload());
    }

    #[test]
    fn tampering_is_detected() {
        let keys = keys_with(0, 13);
        let mut engine = WepEngine::with_iv(7);
        let ciphertext = engine.encrypt(&keys, 0, &FrameBuf::from(payload())).expect("encrypt");
        // The pad bits next to the key id are not covered by the ICV.
        for i in (0..ciphertext.len()).filter(|i| *i != WEP_IV_LEN) {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                engine.decrypt(&keys, &mut FrameBuf::from(tampered)),
                Err(WepError::IntegrityCheckFailed),
                "byte {} flipped",
                i
            );
        }
    }

    #[test]
    fn empty_key_slot() {
        let keys = keys_with(0, 5);
        let mut engine = WepEngine::with_iv(0);
        assert_eq!(
            engine.encrypt(&keys, 1, &FrameBuf::from(payload())),
            Err(WepError::EmptyKey(1))
        );
        let mut ciphertext = engine.encrypt(&keys, 0, &FrameBuf::from(payload())).expect("encrypt");
        ciphertext[WEP_IV_LEN] = 3 << 6;
        assert_eq!(
            engine.decrypt(&keys, &mut FrameBuf::from(ciphertext)),
            Err(WepError::EmptyKey(3))
        );
    }

    #[test]
    fn too_short() {
        let keys = keys_with(0, 5);
        let engine = WepEngine::with_iv(0);
        assert_eq!(
            engine.decrypt(&keys, &mut FrameBuf::from(vec![0u8; 7])),
            Err(WepError::FrameTooShort(7))
        );
    }

    #[test]
    fn fragmented_matches_contiguous() {
        let keys = keys_with(1, 16);
        let contiguous = WepEngine::with_iv(0x123456)
            .encrypt(&keys, 1, &FrameBuf::from(payload()))
            .expect("encrypt");
        let p = payload();
        let fragmented = FrameBuf::from_segments(vec![
            p[..1].to_vec(),
            p[1..40].to_vec(),
            vec![],
            p[40..].to_vec(),
        ]);
        let ciphertext =
            WepEngine::with_iv(0x123456).encrypt(&keys, 1, &fragmented).expect("encrypt");
        assert_eq!(ciphertext, contiguous);

        // Split the ciphertext inside the header and inside the ICV.
        let mut split = FrameBuf::from_segments(vec![
            ciphertext[..2].to_vec(),
            ciphertext[2..50].to_vec(),
            ciphertext[50..106].to_vec(),
            ciphertext[106..].to_vec(),
        ]);
        let engine = WepEngine::new();
        assert_eq!(engine.decrypt(&keys, &mut split), Ok(payload()));
    }

    #[test]
    fn weak_ivs_are_skipped() {
        let mut engine = WepEngine::with_iv(0x03ff00);
        assert_eq!(engine.next_iv(), 0x040000);
        assert_eq!(engine.next_iv(), 0x040001);

        let mut engine = WepEngine::with_iv(0);
        for _ in 0..(1 << 20) {
            let iv = engine.next_iv();
            assert!(!is_weak_iv(iv), "weak iv {:#x}", iv);
            assert_eq!(iv & !IV_MASK, 0);
        }
    }

    #[test]
    fn iv_wraps() {
        let mut engine = WepEngine::with_iv(IV_MASK);
        assert_eq!(engine.next_iv(), IV_MASK);
        assert_eq!(engine.next_iv(), 0);
    }

    #[test]
    fn random_first_iv() {
        let mut engine = WepEngine::new();
        let first = engine.next_iv();
        let second = engine.next_iv();
        assert!(first <= IV_MASK);
        assert_ne!(first, second);
    }

    #[rustfmt::skip]
    fn data_frame() -> Vec<u8> {
        vec![
            0x08, 0x01, // fc: data, to-DS
            0, 0, // duration
            1, 1, 1, 1, 1, 1, // addr1
            2, 2, 2, 2, 2, 2, // addr2
            3, 3, 3, 3, 3, 3, // addr3
            0x10, 0, // seq ctrl
            0xaa, 0xaa, 0x03, 0, 0, 0, 0x08, 0x00, // llc
            1, 2, 3, 4, // payload
        ]
    }

    #[test]
    fn mpdu_round_trip() {
        let keys = keys_with(0, 5);
        let mut engine = WepEngine::with_iv(1);
        let mut frame =
            FrameBuf::from_segments(vec![data_frame()[..10].to_vec(), data_frame()[10..].to_vec()]);
        let protected = engine.encrypt_mpdu(&keys, 0, &mut frame).expect("encrypt");
        assert_eq!(protected.len(), data_frame().len() + WEP_OVERHEAD);
        assert_eq!(protected[1], 0x41);
        assert_eq!(&protected[2..24], &data_frame()[2..24]);

        let plain = engine.decrypt_mpdu(&keys, &mut FrameBuf::from(protected)).expect("decrypt");
        assert_eq!(plain, data_frame());
    }
}
