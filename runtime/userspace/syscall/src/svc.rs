// Licensed under the Apache-2.0 license

// Supervisor call into the MBR on Cortex-M

use nrf_mbr::{SdMbrCommand, Supervisor, SD_MBR_COMMAND};

/// Issues `sd_mbr_command` with the `svc` instruction.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvcSupervisor;

impl Supervisor for SvcSupervisor {
    fn sd_mbr_command(&mut self, param: &mut SdMbrCommand) -> u32 {
        let mut r0 = param as *mut SdMbrCommand as u32;
        // Safety: the MBR SVC handler reads the envelope through r0 and returns the
        // status in r0. r1-r3 and r12 are caller-saved under the AAPCS and may be
        // clobbered by the handler.
        unsafe {
            core::arch::asm!(
                "svc {n}",
                n = const SD_MBR_COMMAND,
                inlateout("r0") r0,
                lateout("r1") _,
                lateout("r2") _,
                lateout("r3") _,
                lateout("r12") _,
            );
        }
        r0
    }
}
