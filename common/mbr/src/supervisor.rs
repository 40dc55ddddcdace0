// Licensed under the Apache-2.0 license

//! The boundary between application code and the MBR firmware.

use crate::abi::SdMbrCommand;

/// Something that can execute `sd_mbr_command`.
///
/// On a device this is the `svc` instruction into the MBR; on the host it is an
/// emulated executor. Implementations return the raw `nrf_error.h` status code.
pub trait Supervisor {
    /// Issues the command. For a successful bootloader copy on real hardware this
    /// call does not return.
    fn sd_mbr_command(&mut self, param: &mut SdMbrCommand) -> u32;
}

impl<S: Supervisor + ?Sized> Supervisor for &mut S {
    fn sd_mbr_command(&mut self, param: &mut SdMbrCommand) -> u32 {
        (**self).sd_mbr_command(param)
    }
}
