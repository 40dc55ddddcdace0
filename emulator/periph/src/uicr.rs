/*++

Licensed under the Apache-2.0 license.

File Name:

    uicr.rs

Abstract:

    User information configuration registers. Only BOOTADDR is interpreted.

--*/

use mbr_config::{NrfMemoryMap, ERASED_WORD, UICR_BOOTADDR_OFFSET};

pub struct Uicr {
    offset: u32,
    words: Vec<u32>,
}

impl Uicr {
    pub fn new(map: &NrfMemoryMap) -> Self {
        Self {
            offset: map.uicr_offset,
            words: vec![ERASED_WORD; (map.uicr_size / 4) as usize],
        }
    }

    pub fn contains(&self, addr: u32, len_bytes: u32) -> bool {
        addr >= self.offset
            && (addr as u64 + len_bytes as u64)
                <= self.offset as u64 + self.words.len() as u64 * 4
    }

    pub fn read_word(&self, addr: u32) -> Option<u32> {
        if addr % 4 != 0 || !self.contains(addr, 4) {
            return None;
        }
        self.words.get(((addr - self.offset) / 4) as usize).copied()
    }

    /// Bootloader start address, or `None` while the register is erased.
    pub fn bootaddr(&self) -> Option<u32> {
        match self.words[(UICR_BOOTADDR_OFFSET / 4) as usize] {
            ERASED_WORD => None,
            addr => Some(addr),
        }
    }

    /// Sets BOOTADDR; `None` erases it.
    pub fn set_bootaddr(&mut self, addr: Option<u32>) {
        self.words[(UICR_BOOTADDR_OFFSET / 4) as usize] = addr.unwrap_or(ERASED_WORD);
    }
}
