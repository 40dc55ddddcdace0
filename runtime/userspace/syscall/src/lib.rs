// Licensed under the Apache-2.0 license

#![no_std]

pub mod mbr;
#[cfg(target_arch = "arm")]
pub mod svc;

pub use mbr::Mbr;

#[cfg(target_arch = "arm")]
pub type DefaultSupervisor = svc::SvcSupervisor;
