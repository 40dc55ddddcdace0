/*++

Licensed under the Apache-2.0 license.

File Name:

    flash_ctrl.rs

Abstract:

    File contains the emulated internal flash and its non-volatile memory controller.

--*/

use mbr_config::{NrfMemoryMap, ERASED_WORD};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use zerocopy::IntoBytes;

/// Flash operations recorded by the controller, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOperation {
    ErasePage { page: u32 },
    Program { addr: u32, len_words: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlashError {
    #[error("address {addr:#010x} (+{len_bytes:#x} bytes) is out of range")]
    OutOfRange { addr: u32, len_bytes: u32 },
    #[error("address {0:#010x} is not word aligned")]
    Misaligned(u32),
    #[error("page {0} is write protected")]
    Protected(u32),
}

/// Emulated NOR flash.
///
/// Erased words read `0xFFFF_FFFF`, programming can only clear bits and erases work on
/// whole pages. Pages can be write protected the way PROTENSET does on hardware.
pub struct DummyFlashCtrl {
    offset: u32,
    page_size: u32,
    words: Vec<u32>,
    protected: Vec<bool>,
    /// Bits that always read back as 1, keyed by word address.
    stuck_bits: HashMap<u32, u32>,
    operations: Vec<FlashOperation>,
}

impl DummyFlashCtrl {
    pub fn new(map: &NrfMemoryMap) -> Self {
        let pages = (map.flash_size / map.page_size) as usize;
        Self {
            offset: map.flash_offset,
            page_size: map.page_size,
            words: vec![ERASED_WORD; (map.flash_size / 4) as usize],
            protected: vec![false; pages],
            stuck_bits: HashMap::new(),
            operations: Vec::new(),
        }
    }

    /// Creates a flash whose contents start with `initial_content`; the rest is erased.
    pub fn with_content(map: &NrfMemoryMap, initial_content: &[u8]) -> Result<Self, FlashError> {
        let mut flash = Self::new(map);
        flash.load(map.flash_offset, initial_content)?;
        Ok(flash)
    }

    /// Opens a flash image file. A missing or short file is padded with erased bytes.
    pub fn from_file(map: &NrfMemoryMap, path: &Path) -> std::io::Result<Self> {
        let mut content = Vec::new();
        if path.exists() {
            File::open(path)?.read_to_end(&mut content)?;
        }
        if content.len() > map.flash_size as usize {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "flash image {} is larger than the flash ({} > {} bytes)",
                    path.display(),
                    content.len(),
                    map.flash_size
                ),
            ));
        }
        Self::with_content(map, &content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Writes the whole flash to `path`.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.words.as_bytes())?;
        file.flush()
    }

    pub fn capacity(&self) -> u32 {
        self.words.len() as u32 * 4
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn contains(&self, addr: u32, len_bytes: u32) -> bool {
        addr >= self.offset
            && (addr as u64 + len_bytes as u64) <= self.offset as u64 + self.capacity() as u64
    }

    pub fn page_of(&self, addr: u32) -> u32 {
        (addr - self.offset) / self.page_size
    }

    fn index(&self, addr: u32, len_words: u32) -> Result<usize, FlashError> {
        if addr % 4 != 0 {
            return Err(FlashError::Misaligned(addr));
        }
        let len_bytes = len_words.saturating_mul(4);
        if !self.contains(addr, len_bytes) {
            return Err(FlashError::OutOfRange { addr, len_bytes });
        }
        Ok(((addr - self.offset) / 4) as usize)
    }

    pub fn read_word(&self, addr: u32) -> Result<u32, FlashError> {
        let i = self.index(addr, 1)?;
        Ok(self.words[i] | self.stuck_bits.get(&addr).copied().unwrap_or(0))
    }

    pub fn read_words(&self, addr: u32, len_words: u32) -> Result<Vec<u32>, FlashError> {
        self.index(addr, len_words)?;
        (0..len_words).map(|i| self.read_word(addr + i * 4)).collect()
    }

    /// Programs `data` starting at `addr`. Like NOR flash, bits can only go from 1 to 0.
    pub fn program(&mut self, addr: u32, data: &[u32]) -> Result<(), FlashError> {
        let start = self.index(addr, data.len() as u32)?;
        let end_addr = addr + data.len() as u32 * 4;
        let mut page_addr = addr;
        while page_addr < end_addr {
            let page = self.page_of(page_addr);
            if self.protected[page as usize] {
                return Err(FlashError::Protected(page));
            }
            page_addr = self.offset + (page + 1) * self.page_size;
        }
        for (word, value) in self.words[start..start + data.len()].iter_mut().zip(data) {
            *word &= *value;
        }
        self.operations.push(FlashOperation::Program {
            addr,
            len_words: data.len() as u32,
        });
        Ok(())
    }

    pub fn erase_page(&mut self, page: u32) -> Result<(), FlashError> {
        let page_words = (self.page_size / 4) as usize;
        if page as usize >= self.protected.len() {
            return Err(FlashError::OutOfRange {
                addr: self.offset + page * self.page_size,
                len_bytes: self.page_size,
            });
        }
        if self.protected[page as usize] {
            return Err(FlashError::Protected(page));
        }
        let start = page as usize * page_words;
        self.words[start..start + page_words].fill(ERASED_WORD);
        self.operations.push(FlashOperation::ErasePage { page });
        Ok(())
    }

    /// Places raw bytes into flash, bypassing the controller. Used to stage images the
    /// way an external programmer would.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) -> Result<(), FlashError> {
        let len_words = bytes.len().div_ceil(4) as u32;
        let start = self.index(addr, len_words)?;
        let mut padded = bytes.to_vec();
        padded.resize(len_words as usize * 4, 0xff);
        let words: Vec<u32> = padded
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        self.words[start..start + words.len()].copy_from_slice(&words);
        Ok(())
    }

    /// Write protects every page overlapping `[addr, addr + len_bytes)`.
    pub fn protect(&mut self, addr: u32, len_bytes: u32) {
        if len_bytes == 0 || addr < self.offset {
            return;
        }
        let first = self.page_of(addr) as usize;
        let last = (self.page_of(addr + len_bytes - 1) as usize).min(self.protected.len() - 1);
        for p in first..=last {
            self.protected[p] = true;
        }
    }

    pub fn is_protected(&self, page: u32) -> bool {
        self.protected.get(page as usize).copied().unwrap_or(false)
    }

    /// Clears all write protection. Protection only goes away on reset on real parts.
    pub fn clear_protection(&mut self) {
        self.protected.fill(false);
    }

    /// Makes `mask` bits of the word at `addr` read back as 1 regardless of what is programmed.
    pub fn inject_stuck_bits(&mut self, addr: u32, mask: u32) {
        *self.stuck_bits.entry(addr).or_insert(0) |= mask;
    }

    pub fn operations(&self) -> &[FlashOperation] {
        &self.operations
    }

    pub fn take_operations(&mut self) -> Vec<FlashOperation> {
        std::mem::take(&mut self.operations)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.words.as_bytes()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_helper_flash() -> DummyFlashCtrl {
        DummyFlashCtrl::new(&NrfMemoryMap::default())
    }

    #[test]
    fn test_starts_erased() {
        let flash = test_helper_flash();
        assert_eq!(flash.capacity(), 256 * 1024);
        assert_eq!(flash.read_word(0).unwrap(), ERASED_WORD);
        assert_eq!(flash.read_word(0x3_fffc).unwrap(), ERASED_WORD);
        assert!(flash.read_word(0x4_0000).is_err());
        assert_eq!(flash.read_word(2), Err(FlashError::Misaligned(2)));
    }

    #[test]
    fn test_program_only_clears_bits() {
        let mut flash = test_helper_flash();
        flash.program(0x2000, &[0xf0f0_f0f0]).unwrap();
        flash.program(0x2000, &[0xff00_ff00]).unwrap();
        assert_eq!(flash.read_word(0x2000).unwrap(), 0xf000_f000);

        flash.erase_page(flash.page_of(0x2000)).unwrap();
        assert_eq!(flash.read_word(0x2000).unwrap(), ERASED_WORD);
        assert_eq!(
            flash.operations(),
            &[
                FlashOperation::Program {
                    addr: 0x2000,
                    len_words: 1
                },
                FlashOperation::Program {
                    addr: 0x2000,
                    len_words: 1
                },
                FlashOperation::ErasePage { page: 8 },
            ]
        );
    }

    #[test]
    fn test_protected_pages_reject_changes() {
        let mut flash = test_helper_flash();
        flash.protect(0, 0x1000);
        assert!(flash.is_protected(3));
        assert!(!flash.is_protected(4));
        assert_eq!(flash.erase_page(1), Err(FlashError::Protected(1)));
        assert_eq!(
            flash.program(0xffc, &[0, 0]),
            Err(FlashError::Protected(3))
        );
        flash.program(0x1000, &[0]).unwrap();

        flash.clear_protection();
        flash.erase_page(1).unwrap();
    }

    #[test]
    fn test_stuck_bits() {
        let mut flash = test_helper_flash();
        flash.inject_stuck_bits(0x1004, 0x1);
        flash.program(0x1004, &[0]).unwrap();
        assert_eq!(flash.read_word(0x1004).unwrap(), 1);
    }

    #[test]
    fn test_load_pads_partial_word() {
        let mut flash = test_helper_flash();
        flash.load(0x100, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            flash.read_word(0x100).unwrap(),
            u32::from_ne_bytes([1, 2, 3, 4])
        );
        assert_eq!(
            flash.read_word(0x104).unwrap(),
            u32::from_ne_bytes([5, 0xff, 0xff, 0xff])
        );
        assert!(flash.operations().is_empty());
    }

    #[test]
    fn test_file_backing() {
        let map = NrfMemoryMap::default();
        let test_file = NamedTempFile::new().unwrap().path().to_path_buf();

        let mut flash = DummyFlashCtrl::from_file(&map, &test_file).unwrap();
        flash.program(0x1_0000, &[0x1234_5678, 0x9abc_def0]).unwrap();
        flash.save(&test_file).unwrap();

        let bytes = std::fs::read(&test_file).unwrap();
        assert_eq!(bytes.len(), map.flash_size as usize);
        assert_eq!(&bytes[..4], &[0xff; 4]);

        let reopened = DummyFlashCtrl::from_file(&map, &test_file).unwrap();
        assert_eq!(
            reopened.read_words(0x1_0000, 2).unwrap(),
            vec![0x1234_5678, 0x9abc_def0]
        );
    }

    #[test]
    fn test_oversized_image_rejected() {
        let map = NrfMemoryMap::default();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; map.flash_size as usize + 4])
            .unwrap();
        assert!(DummyFlashCtrl::from_file(&map, file.path()).is_err());
    }
}
