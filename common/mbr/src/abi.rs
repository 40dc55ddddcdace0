/*++

Licensed under the Apache-2.0 license.

File Name:

    abi.rs

Abstract:

    Binary layout of the Master Boot Record supervisor call interface.

--*/

use core::fmt;
use core::mem::{offset_of, size_of};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

/// MBR SVC base number.
pub const MBR_SVC_BASE: u8 = 0x18;

/// SVC numbers exposed by the MBR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MbrSvc {
    /// `sd_mbr_command`
    SdMbrCommand = MBR_SVC_BASE,
}

/// SVC number used to issue `sd_mbr_command`.
pub const SD_MBR_COMMAND: u8 = MbrSvc::SdMbrCommand as u8;

/// Copy lengths for the SoftDevice copy command must be a multiple of this many words.
pub const COPY_LEN_MULTIPLE_WORDS: u32 = 256;

/// Possible values for [`SdMbrCommand::command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum MbrCommandCode {
    /// Copy a new bootloader. See [`SdMbrCommandCopyBl`].
    CopyBl = 0,
    /// Copy a new SoftDevice. See [`SdMbrCommandCopy`].
    Copy = 1,
    /// Start forwarding interrupts to the SoftDevice and run its reset function.
    StartSd = 2,
    /// Compare two memory blocks word by word. See [`SdMbrCommandVerify`].
    Verify = 3,
}

/// Copies part of a new SoftDevice. The destination area is erased before copying.
///
/// The caller is responsible for setting the PROTENSET registers.
#[repr(C)]
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct SdMbrCommandCopy {
    /// Address of the source of data to be copied.
    pub src: u32,
    /// Address of the destination.
    pub dst: u32,
    /// Number of 32 bit words to copy. Must be a multiple of 256 words.
    pub len: u32,
}

/// Works like memcmp, but takes the length in words.
#[repr(C)]
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct SdMbrCommandVerify {
    /// Pointer to block of memory.
    pub ptr1: u32,
    /// Pointer to block of memory.
    pub ptr2: u32,
    /// Number of 32 bit words to compare.
    pub len: u32,
}

/// Copies a new bootloader to the address held in `UICR.BOOTADDR`.
///
/// On success the call does not return; the new bootloader is started from its reset vector.
#[repr(C)]
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct SdMbrCommandCopyBl {
    /// Address of the bootloader image to be copied.
    pub bl_src: u32,
    /// Number of 32 bit words to copy.
    pub bl_len: u32,
}

/// Parameter block of [`SdMbrCommand`]. Only the member selected by the command code is meaningful.
#[repr(C)]
#[derive(Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub union SdMbrCommandParams {
    pub copy: SdMbrCommandCopy,
    pub copy_bl: SdMbrCommandCopyBl,
    pub verify: SdMbrCommandVerify,
}

/// Command envelope passed by reference to `sd_mbr_command`.
///
/// Every constructor initializes all 16 bytes, so any union member can be read back
/// regardless of which one was written.
#[repr(C)]
#[derive(Clone, Copy, FromBytes, Immutable, KnownLayout)]
pub struct SdMbrCommand {
    command: u32,
    params: SdMbrCommandParams,
}

const _: () = assert!(size_of::<SdMbrCommandCopy>() == 12);
const _: () = assert!(size_of::<SdMbrCommandVerify>() == 12);
const _: () = assert!(size_of::<SdMbrCommandCopyBl>() == 8);
const _: () = assert!(size_of::<SdMbrCommandParams>() == size_of::<SdMbrCommandCopy>());
const _: () = assert!(size_of::<SdMbrCommand>() == SdMbrCommand::SIZE);
const _: () = assert!(offset_of!(SdMbrCommand, params) == 4);

impl SdMbrCommand {
    /// Size of the envelope in bytes.
    pub const SIZE: usize = 16;

    /// Builds an envelope from a raw command value and the three parameter words,
    /// without checking that the command value is known.
    pub fn from_raw(command: u32, params: [u32; 3]) -> Self {
        let mut cmd = Self::new_zeroed();
        cmd.command = command;
        cmd.params.copy = SdMbrCommandCopy {
            src: params[0],
            dst: params[1],
            len: params[2],
        };
        cmd
    }

    pub fn copy(params: SdMbrCommandCopy) -> Self {
        let mut cmd = Self::new_zeroed();
        cmd.command = MbrCommandCode::Copy.into();
        cmd.params.copy = params;
        cmd
    }

    pub fn copy_bl(params: SdMbrCommandCopyBl) -> Self {
        let mut cmd = Self::new_zeroed();
        cmd.command = MbrCommandCode::CopyBl.into();
        cmd.params.copy_bl = params;
        cmd
    }

    pub fn verify(params: SdMbrCommandVerify) -> Self {
        let mut cmd = Self::new_zeroed();
        cmd.command = MbrCommandCode::Verify.into();
        cmd.params.verify = params;
        cmd
    }

    pub fn start_sd() -> Self {
        let mut cmd = Self::new_zeroed();
        cmd.command = MbrCommandCode::StartSd.into();
        cmd
    }

    /// Raw command value, see [`MbrCommandCode`].
    pub fn command(&self) -> u32 {
        self.command
    }

    /// The command code, if the raw value is one the MBR knows about.
    pub fn code(&self) -> Option<MbrCommandCode> {
        MbrCommandCode::try_from(self.command).ok()
    }

    pub fn copy_params(&self) -> SdMbrCommandCopy {
        // SAFETY: all bytes of `params` are initialized by every constructor and every
        // bit pattern is a valid `SdMbrCommandCopy`.
        unsafe { self.params.copy }
    }

    pub fn copy_bl_params(&self) -> SdMbrCommandCopyBl {
        // SAFETY: see `copy_params`.
        unsafe { self.params.copy_bl }
    }

    pub fn verify_params(&self) -> SdMbrCommandVerify {
        // SAFETY: see `copy_params`.
        unsafe { self.params.verify }
    }

    /// The three parameter words as they are laid out in memory.
    pub fn params_words(&self) -> [u32; 3] {
        let p = self.copy_params();
        [p.src, p.dst, p.len]
    }

    /// The envelope as four native-endian words: command followed by the parameter block.
    pub fn to_words(&self) -> [u32; 4] {
        let [a, b, c] = self.params_words();
        [self.command, a, b, c]
    }

    /// The envelope exactly as the MBR reads it from memory.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        zerocopy::transmute!(self.to_words())
    }
}

impl Default for SdMbrCommand {
    fn default() -> Self {
        Self::new_zeroed()
    }
}

impl PartialEq for SdMbrCommand {
    fn eq(&self, other: &Self) -> bool {
        self.to_words() == other.to_words()
    }
}

impl Eq for SdMbrCommand {}

impl fmt::Debug for SdMbrCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdMbrCommand")
            .field("command", &self.command)
            .field("params", &self.params_words())
            .finish()
    }
}
