/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Master Boot Record API for updating the SoftDevice and bootloader.

--*/

#![no_std]

pub mod abi;
pub mod command;
pub mod error;
pub mod supervisor;

pub use abi::{
    MbrCommandCode, MbrSvc, SdMbrCommand, SdMbrCommandCopy, SdMbrCommandCopyBl,
    SdMbrCommandParams, SdMbrCommandVerify, COPY_LEN_MULTIPLE_WORDS, MBR_SVC_BASE,
    SD_MBR_COMMAND,
};
pub use command::{MbrCommand, UnknownCommand};
pub use error::{status_name, MbrError, MbrResult, NRF_ERROR_BASE_NUM, NRF_SUCCESS};
pub use supervisor::Supervisor;
