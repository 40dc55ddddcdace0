// Licensed under the Apache-2.0 license

// MBR userspace library

use log::debug;
use nrf_mbr::{MbrCommand, MbrError, MbrResult, SdMbrCommand, Supervisor};

/// Typed access to the Master Boot Record.
pub struct Mbr<S: Supervisor> {
    supervisor: S,
}

#[cfg(target_arch = "arm")]
impl Default for Mbr<crate::DefaultSupervisor> {
    fn default() -> Self {
        Self::new(crate::DefaultSupervisor::default())
    }
}

impl<S: Supervisor> Mbr<S> {
    pub fn new(supervisor: S) -> Self {
        Self { supervisor }
    }

    pub fn supervisor(&self) -> &S {
        &self.supervisor
    }

    pub fn supervisor_mut(&mut self) -> &mut S {
        &mut self.supervisor
    }

    pub fn into_inner(self) -> S {
        self.supervisor
    }

    /// Passes a raw envelope straight to the MBR and returns its status code.
    pub fn command_raw(&mut self, param: &mut SdMbrCommand) -> u32 {
        self.supervisor.sd_mbr_command(param)
    }

    /// Encodes and issues `cmd`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the MBR returned `NRF_SUCCESS`.
    /// * `Err(MbrError)` with the status it returned otherwise.
    pub fn command(&mut self, cmd: &MbrCommand) -> MbrResult<()> {
        let mut raw = cmd.to_raw();
        debug!("sd_mbr_command {:?}", raw);
        let status = self.command_raw(&mut raw);
        MbrError::check(status)
    }

    /// Replaces the bootloader at `UICR.BOOTADDR` with `len` words from `src`.
    ///
    /// On a device the MBR resets into the new bootloader on success, so this only
    /// returns when the copy failed.
    pub fn copy_bootloader(&mut self, src: u32, len: u32) -> MbrResult<()> {
        self.command(&MbrCommand::CopyBootloader { src, len })
    }

    /// Erases `dst` and copies `len` words from `src`. `len` must be a multiple of
    /// 256 words. The copy is verified before the call returns.
    pub fn copy_softdevice(&mut self, src: u32, dst: u32, len: u32) -> MbrResult<()> {
        self.command(&MbrCommand::CopySoftDevice { src, dst, len })
    }

    pub fn start_softdevice(&mut self) -> MbrResult<()> {
        self.command(&MbrCommand::StartSoftDevice)
    }

    /// Compares `len` words at `ptr1` and `ptr2`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the regions are equal, `Ok(false)` if any word differs.
    /// * `Err(MbrError)` for any other status.
    pub fn verify(&mut self, ptr1: u32, ptr2: u32, len: u32) -> MbrResult<bool> {
        match self.command(&MbrCommand::Verify { ptr1, ptr2, len }) {
            Ok(()) => Ok(true),
            Err(MbrError::Null) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
