// Licensed under the Apache-2.0 license

use crate::abi::{
    MbrCommandCode, SdMbrCommand, SdMbrCommandCopy, SdMbrCommandCopyBl, SdMbrCommandVerify,
};
use thiserror::Error;

/// The envelope carried a command value the MBR does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown MBR command {0}")]
pub struct UnknownCommand(pub u32);

/// An MBR request. Each variant carries only the parameters its command reads.
///
/// Addresses are 32-bit device addresses and lengths count 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbrCommand {
    /// Copy a bootloader image to `UICR.BOOTADDR` and start it.
    CopyBootloader { src: u32, len: u32 },
    /// Erase `dst` and copy `len` words from `src`. `len` must be a multiple of 256.
    CopySoftDevice { src: u32, dst: u32, len: u32 },
    /// Forward interrupts to the SoftDevice and run its reset function.
    StartSoftDevice,
    /// Compare `len` words at `ptr1` and `ptr2`.
    Verify { ptr1: u32, ptr2: u32, len: u32 },
}

impl MbrCommand {
    pub fn code(&self) -> MbrCommandCode {
        match self {
            MbrCommand::CopyBootloader { .. } => MbrCommandCode::CopyBl,
            MbrCommand::CopySoftDevice { .. } => MbrCommandCode::Copy,
            MbrCommand::StartSoftDevice => MbrCommandCode::StartSd,
            MbrCommand::Verify { .. } => MbrCommandCode::Verify,
        }
    }

    /// Encodes the command into the envelope layout the MBR expects.
    pub fn to_raw(&self) -> SdMbrCommand {
        match *self {
            MbrCommand::CopyBootloader { src, len } => SdMbrCommand::copy_bl(SdMbrCommandCopyBl {
                bl_src: src,
                bl_len: len,
            }),
            MbrCommand::CopySoftDevice { src, dst, len } => {
                SdMbrCommand::copy(SdMbrCommandCopy { src, dst, len })
            }
            MbrCommand::StartSoftDevice => SdMbrCommand::start_sd(),
            MbrCommand::Verify { ptr1, ptr2, len } => {
                SdMbrCommand::verify(SdMbrCommandVerify { ptr1, ptr2, len })
            }
        }
    }
}

impl From<MbrCommand> for SdMbrCommand {
    fn from(cmd: MbrCommand) -> Self {
        cmd.to_raw()
    }
}

impl TryFrom<&SdMbrCommand> for MbrCommand {
    type Error = UnknownCommand;

    fn try_from(raw: &SdMbrCommand) -> Result<Self, Self::Error> {
        let code = raw.code().ok_or(UnknownCommand(raw.command()))?;
        Ok(match code {
            MbrCommandCode::CopyBl => {
                let p = raw.copy_bl_params();
                MbrCommand::CopyBootloader {
                    src: p.bl_src,
                    len: p.bl_len,
                }
            }
            MbrCommandCode::Copy => {
                let p = raw.copy_params();
                MbrCommand::CopySoftDevice {
                    src: p.src,
                    dst: p.dst,
                    len: p.len,
                }
            }
            MbrCommandCode::StartSd => MbrCommand::StartSoftDevice,
            MbrCommandCode::Verify => {
                let p = raw.verify_params();
                MbrCommand::Verify {
                    ptr1: p.ptr1,
                    ptr2: p.ptr2,
                    len: p.len,
                }
            }
        })
    }
}
