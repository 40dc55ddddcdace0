/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the nRF MBR emulator peripheral library.

--*/

mod flash_ctrl;
mod mbr;
mod uicr;

pub use flash_ctrl::{DummyFlashCtrl, FlashError, FlashOperation};
pub use mbr::{BootJump, EmulatedMbr, SoftDeviceState};
pub use uicr::Uicr;
