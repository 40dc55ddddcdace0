/*++

Licensed under the Apache-2.0 license.

File Name:

    mbr.rs

Abstract:

    Emulated Master Boot Record. Executes `sd_mbr_command` requests against the
    emulated flash, RAM and UICR.

--*/

use crate::flash_ctrl::{DummyFlashCtrl, FlashError};
use crate::uicr::Uicr;
use log::{debug, info, warn};
use mbr_config::{NrfMemoryMap, ERASED_WORD};
use nrf_mbr::{
    MbrCommand, MbrError, MbrResult, SdMbrCommand, Supervisor, COPY_LEN_MULTIPLE_WORDS,
    NRF_SUCCESS,
};
use zerocopy::IntoBytes;

/// Whether the MBR forwards interrupts to a SoftDevice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftDeviceState {
    #[default]
    Stopped,
    Running { vector_table: u32 },
}

/// Where the core would continue after a reset into a new bootloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootJump {
    pub stack_pointer: u32,
    pub reset_vector: u32,
}

pub struct EmulatedMbr {
    map: NrfMemoryMap,
    flash: DummyFlashCtrl,
    ram: Vec<u32>,
    uicr: Uicr,
    softdevice: SoftDeviceState,
    boot_jump: Option<BootJump>,
}

fn overlaps(a: u32, a_len: u32, b: u32, b_len: u32) -> bool {
    (a as u64) < b as u64 + b_len as u64 && (b as u64) < a as u64 + a_len as u64
}

impl EmulatedMbr {
    pub fn new(map: NrfMemoryMap) -> Self {
        let flash = DummyFlashCtrl::new(&map);
        Self::with_flash(map, flash)
    }

    pub fn with_flash(map: NrfMemoryMap, flash: DummyFlashCtrl) -> Self {
        Self {
            ram: vec![0; (map.ram_size / 4) as usize],
            uicr: Uicr::new(&map),
            flash,
            map,
            softdevice: SoftDeviceState::default(),
            boot_jump: None,
        }
    }

    pub fn map(&self) -> &NrfMemoryMap {
        &self.map
    }

    pub fn flash(&self) -> &DummyFlashCtrl {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut DummyFlashCtrl {
        &mut self.flash
    }

    pub fn uicr(&self) -> &Uicr {
        &self.uicr
    }

    pub fn uicr_mut(&mut self) -> &mut Uicr {
        &mut self.uicr
    }

    pub fn softdevice(&self) -> SoftDeviceState {
        self.softdevice
    }

    pub fn boot_jump(&self) -> Option<BootJump> {
        self.boot_jump
    }

    pub fn take_boot_jump(&mut self) -> Option<BootJump> {
        self.boot_jump.take()
    }

    pub fn into_flash(self) -> DummyFlashCtrl {
        self.flash
    }

    /// Resets the chip. Flash and RAM keep their contents.
    pub fn reset(&mut self) {
        self.flash.clear_protection();
        self.softdevice = SoftDeviceState::Stopped;
    }

    /// Places `bytes` into flash or RAM without going through the flash controller.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) -> Result<(), FlashError> {
        let len_bytes = bytes.len() as u32;
        if self.flash.contains(addr, len_bytes) {
            return self.flash.load(addr, bytes);
        }
        if addr % 4 != 0 {
            return Err(FlashError::Misaligned(addr));
        }
        if !self.map.in_ram(addr, len_bytes) {
            return Err(FlashError::OutOfRange { addr, len_bytes });
        }
        let start = ((addr - self.map.ram_offset) / 4) as usize;
        for (i, chunk) in bytes.chunks(4).enumerate() {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.ram[start + i] = u32::from_ne_bytes(word);
        }
        Ok(())
    }

    /// Same as [`EmulatedMbr::load`] for word data.
    pub fn load_words(&mut self, addr: u32, words: &[u32]) -> Result<(), FlashError> {
        self.load(addr, words.as_bytes())
    }

    fn readable(&self, addr: u32, len_bytes: u32) -> bool {
        addr % 4 == 0
            && (self.flash.contains(addr, len_bytes)
                || self.map.in_ram(addr, len_bytes)
                || self.uicr.contains(addr, len_bytes))
    }

    /// Reads a word the way the CPU would see it on the bus.
    pub fn read_word(&self, addr: u32) -> Option<u32> {
        if self.flash.contains(addr, 4) {
            self.flash.read_word(addr).ok()
        } else if self.map.in_ram(addr, 4) && addr % 4 == 0 {
            self.ram
                .get(((addr - self.map.ram_offset) / 4) as usize)
                .copied()
        } else {
            self.uicr.read_word(addr)
        }
    }

    /// Reads `len` words from a single memory region.
    pub fn read_words(&self, addr: u32, len: u32) -> Option<Vec<u32>> {
        let len_bytes = len.checked_mul(4)?;
        if !self.readable(addr, len_bytes) {
            return None;
        }
        (0..len).map(|i| self.read_word(addr + i * 4)).collect()
    }

    /// Runs one command and returns its outcome.
    pub fn execute(&mut self, cmd: &MbrCommand) -> MbrResult<()> {
        debug!("MBR command {:?}", cmd);
        let result = match *cmd {
            MbrCommand::CopyBootloader { src, len } => self.copy_bootloader(src, len),
            MbrCommand::CopySoftDevice { src, dst, len } => self.copy_softdevice(src, dst, len),
            MbrCommand::StartSoftDevice => self.start_softdevice(),
            MbrCommand::Verify { ptr1, ptr2, len } => self.verify(ptr1, ptr2, len),
        };
        match result {
            // Verify reports differing regions as NULL.
            Err(MbrError::Null) => debug!("MBR verify: regions differ"),
            Err(e) => warn!("MBR command {:?} failed: {}", cmd.code(), e.name()),
            Ok(()) => {}
        }
        result
    }

    /// Erases every page of `[addr, addr + len_bytes)` and programs `data` one page at
    /// a time. Operations on protected pages are dropped.
    fn erase_and_program(&mut self, addr: u32, data: &[u32]) {
        let page_size = self.flash.page_size();
        let first = self.flash.page_of(addr);
        let last = self.flash.page_of(addr + data.len() as u32 * 4 - 1);
        for page in first..=last {
            if let Err(e) = self.flash.erase_page(page) {
                warn!("Dropped flash erase: {}", e);
            }
        }
        for (i, chunk) in data.chunks((page_size / 4) as usize).enumerate() {
            let chunk_addr = addr + i as u32 * page_size;
            if let Err(e) = self.flash.program(chunk_addr, chunk) {
                warn!("Dropped flash write: {}", e);
            }
        }
    }

    fn program_verified(&mut self, dst: u32, data: &[u32]) -> MbrResult<()> {
        self.erase_and_program(dst, data);
        match self.flash.read_words(dst, data.len() as u32) {
            Ok(written) if written == data => Ok(()),
            _ => Err(MbrError::Internal),
        }
    }

    fn copy_softdevice(&mut self, src: u32, dst: u32, len: u32) -> MbrResult<()> {
        if self.softdevice != SoftDeviceState::Stopped {
            return Err(MbrError::InvalidState);
        }
        if len % COPY_LEN_MULTIPLE_WORDS != 0 {
            return Err(MbrError::InvalidLength);
        }
        if len == 0 {
            return Ok(());
        }
        let len_bytes = len.checked_mul(4).ok_or(MbrError::InvalidAddr)?;
        // Erases are page sized, so a partial last page would erase past the destination.
        if len_bytes % self.map.page_size != 0 {
            return Err(MbrError::InvalidLength);
        }
        if !self.map.is_page_aligned(dst)
            || !self.map.in_flash(dst, len_bytes)
            || dst < self.map.softdevice_base()
            || overlaps(src, len_bytes, dst, len_bytes)
        {
            return Err(MbrError::InvalidAddr);
        }
        let data = self.read_words(src, len).ok_or(MbrError::InvalidAddr)?;
        self.program_verified(dst, &data)
    }

    fn copy_bootloader(&mut self, src: u32, len: u32) -> MbrResult<()> {
        let Some(bootaddr) = self.uicr.bootaddr() else {
            return Err(MbrError::Forbidden);
        };
        if self.softdevice != SoftDeviceState::Stopped
            || !self.map.is_page_aligned(bootaddr)
            || bootaddr < self.map.softdevice_base()
        {
            return Err(MbrError::InvalidState);
        }
        let len_bytes = len.checked_mul(4).ok_or(MbrError::InvalidLength)?;
        if len == 0 || !self.map.in_flash(bootaddr, len_bytes) {
            return Err(MbrError::InvalidLength);
        }
        if overlaps(src, len_bytes, bootaddr, len_bytes) {
            return Err(MbrError::InvalidState);
        }
        let data = self.read_words(src, len).ok_or(MbrError::InvalidAddr)?;

        self.flash
            .protect(self.map.flash_offset, bootaddr - self.map.flash_offset);
        self.program_verified(bootaddr, &data)?;

        let stack_pointer = self.read_word(bootaddr).ok_or(MbrError::Internal)?;
        let reset_vector = self
            .read_word(bootaddr.wrapping_add(4))
            .ok_or(MbrError::Internal)?;
        self.reset();
        info!(
            "Starting bootloader at {:#010x}: sp={:#010x} pc={:#010x}",
            bootaddr, stack_pointer, reset_vector
        );
        self.boot_jump = Some(BootJump {
            stack_pointer,
            reset_vector,
        });
        Ok(())
    }

    fn start_softdevice(&mut self) -> MbrResult<()> {
        if self.softdevice != SoftDeviceState::Stopped {
            return Err(MbrError::InvalidState);
        }
        let base = self.map.softdevice_base();
        match self.read_word(base + 4) {
            Some(ERASED_WORD) | None => Err(MbrError::InvalidState),
            Some(reset_vector) => {
                info!(
                    "Forwarding interrupts to SoftDevice at {:#010x}, reset vector {:#010x}",
                    base, reset_vector
                );
                self.softdevice = SoftDeviceState::Running { vector_table: base };
                Ok(())
            }
        }
    }

    fn verify(&self, ptr1: u32, ptr2: u32, len: u32) -> MbrResult<()> {
        if len == 0 {
            return Ok(());
        }
        let a = self.read_words(ptr1, len).ok_or(MbrError::InvalidAddr)?;
        let b = self.read_words(ptr2, len).ok_or(MbrError::InvalidAddr)?;
        if a == b {
            Ok(())
        } else {
            Err(MbrError::Null)
        }
    }
}

impl Supervisor for EmulatedMbr {
    fn sd_mbr_command(&mut self, param: &mut SdMbrCommand) -> u32 {
        let cmd = match MbrCommand::try_from(&*param) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("Rejecting MBR request: {}", e);
                return MbrError::InvalidParam.code();
            }
        };
        match self.execute(&cmd) {
            Ok(()) => NRF_SUCCESS,
            Err(e) => e.code(),
        }
    }
}
