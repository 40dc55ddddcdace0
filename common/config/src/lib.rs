// Licensed under the Apache-2.0 license

#![cfg_attr(target_arch = "arm", no_std)]

/// Offset of the BOOTADDR register within the UICR.
pub const UICR_BOOTADDR_OFFSET: u32 = 0x14;

/// Value of an erased flash word, and of BOOTADDR when no bootloader is configured.
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Configures the memory map of the device the MBR runs on.
/// The defaults describe a 256 KiB nRF51 part and can be overridden by the emulator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NrfMemoryMap {
    pub flash_offset: u32,
    pub flash_size: u32,
    pub page_size: u32,
    /// Flash reserved for the MBR itself; the SoftDevice starts right after it.
    pub mbr_size: u32,
    pub ram_offset: u32,
    pub ram_size: u32,
    pub uicr_offset: u32,
    pub uicr_size: u32,
}

impl Default for NrfMemoryMap {
    fn default() -> Self {
        NrfMemoryMap {
            flash_offset: 0x0000_0000,
            flash_size: 256 * 1024,
            page_size: 1024,
            mbr_size: 0x1000,
            ram_offset: 0x2000_0000,
            ram_size: 16 * 1024,
            uicr_offset: 0x1000_1000,
            uicr_size: 0x100,
        }
    }
}

impl NrfMemoryMap {
    /// Number of 32-bit words in one flash page.
    pub const fn page_words(&self) -> u32 {
        self.page_size / 4
    }

    pub const fn flash_end(&self) -> u32 {
        self.flash_offset + self.flash_size
    }

    pub const fn ram_end(&self) -> u32 {
        self.ram_offset + self.ram_size
    }

    /// Start of the SoftDevice region, directly above the MBR.
    pub const fn softdevice_base(&self) -> u32 {
        self.flash_offset + self.mbr_size
    }

    /// Address of the UICR.BOOTADDR register.
    pub const fn bootaddr_register(&self) -> u32 {
        self.uicr_offset + UICR_BOOTADDR_OFFSET
    }

    pub const fn is_page_aligned(&self, addr: u32) -> bool {
        addr >= self.flash_offset && (addr - self.flash_offset) % self.page_size == 0
    }

    pub const fn in_flash(&self, addr: u32, len_bytes: u32) -> bool {
        addr >= self.flash_offset
            && (addr as u64 + len_bytes as u64) <= self.flash_end() as u64
    }

    pub const fn in_ram(&self, addr: u32, len_bytes: u32) -> bool {
        addr >= self.ram_offset && (addr as u64 + len_bytes as u64) <= self.ram_end() as u64
    }

    #[cfg(not(target_arch = "arm"))]
    pub fn hash_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();
        map.insert(
            "FLASH_OFFSET".to_string(),
            format!("0x{:x}", self.flash_offset),
        );
        map.insert("FLASH_SIZE".to_string(), format!("0x{:x}", self.flash_size));
        map.insert("PAGE_SIZE".to_string(), format!("0x{:x}", self.page_size));
        map.insert("MBR_SIZE".to_string(), format!("0x{:x}", self.mbr_size));
        map.insert("RAM_OFFSET".to_string(), format!("0x{:x}", self.ram_offset));
        map.insert("RAM_SIZE".to_string(), format!("0x{:x}", self.ram_size));
        map.insert(
            "UICR_OFFSET".to_string(),
            format!("0x{:x}", self.uicr_offset),
        );
        map.insert("UICR_SIZE".to_string(), format!("0x{:x}", self.uicr_size));
        map
    }
}
