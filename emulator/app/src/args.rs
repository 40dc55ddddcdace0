/*++

Licensed under the Apache-2.0 license.

File Name:

    args.rs

Abstract:

    Command line arguments for the nRF MBR emulator.

--*/

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use clap_num::maybe_hex;
use mbr_config::NrfMemoryMap;
use nrf_mbr::MbrCommand;
use std::path::PathBuf;

/// A binary file to place in memory before the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadArg {
    pub path: PathBuf,
    pub addr: u32,
}

fn parse_load(s: &str) -> Result<LoadArg, String> {
    let Some((path, addr)) = s.rsplit_once('@') else {
        return Err(format!("Invalid load argument: {}. Expected <file>@<addr>.", s));
    };
    if path.is_empty() {
        return Err(format!("Missing file name in load argument: {}", s));
    }
    let addr = maybe_hex::<u32>(addr)?;
    Ok(LoadArg {
        path: PathBuf::from(path),
        addr,
    })
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, name = "nRF MBR Emulator")]
pub struct EmulatorArgs {
    /// Flash image to start from. Written back after the command unless --save is given.
    #[arg(short, long)]
    pub flash: Option<PathBuf>,

    /// Where to write the flash image after the command.
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    #[arg(long, value_parser = maybe_hex::<u32>, default_value_t = NrfMemoryMap::default().flash_size)]
    pub flash_size: u32,

    #[arg(long, value_parser = maybe_hex::<u32>, default_value_t = NrfMemoryMap::default().page_size)]
    pub page_size: u32,

    /// Value of UICR.BOOTADDR. Left erased when not given.
    #[arg(long, value_parser = maybe_hex::<u32>)]
    pub bootaddr: Option<u32>,

    /// Load <file>@<addr> into flash or RAM before running the command. May be repeated.
    #[arg(short, long, value_parser = parse_load)]
    pub load: Vec<LoadArg>,

    /// Log every command and flash operation.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: MbrSubcommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MbrSubcommand {
    /// Copy a bootloader to UICR.BOOTADDR and jump to it
    CopyBl {
        #[arg(long, value_parser = maybe_hex::<u32>)]
        src: u32,
        /// Length in 32-bit words
        #[arg(long, value_parser = maybe_hex::<u32>)]
        len: u32,
    },
    /// Copy a SoftDevice image
    Copy {
        #[arg(long, value_parser = maybe_hex::<u32>)]
        src: u32,
        #[arg(long, value_parser = maybe_hex::<u32>)]
        dst: u32,
        /// Length in 32-bit words, a multiple of 256
        #[arg(long, value_parser = maybe_hex::<u32>)]
        len: u32,
    },
    /// Start forwarding interrupts to the SoftDevice
    StartSd,
    /// Compare two memory regions
    Verify {
        #[arg(long, value_parser = maybe_hex::<u32>)]
        ptr1: u32,
        #[arg(long, value_parser = maybe_hex::<u32>)]
        ptr2: u32,
        /// Length in 32-bit words
        #[arg(long, value_parser = maybe_hex::<u32>)]
        len: u32,
    },
}

impl From<&MbrSubcommand> for MbrCommand {
    fn from(cmd: &MbrSubcommand) -> Self {
        match *cmd {
            MbrSubcommand::CopyBl { src, len } => MbrCommand::CopyBootloader { src, len },
            MbrSubcommand::Copy { src, dst, len } => MbrCommand::CopySoftDevice { src, dst, len },
            MbrSubcommand::StartSd => MbrCommand::StartSoftDevice,
            MbrSubcommand::Verify { ptr1, ptr2, len } => MbrCommand::Verify { ptr1, ptr2, len },
        }
    }
}

impl EmulatorArgs {
    /// The memory map with the flash geometry overrides applied.
    pub fn memory_map(&self) -> Result<NrfMemoryMap> {
        let map = NrfMemoryMap {
            flash_size: self.flash_size,
            page_size: self.page_size,
            ..Default::default()
        };
        if map.page_size == 0 || map.page_size % 4 != 0 {
            bail!("Page size {:#x} is not a multiple of 4", map.page_size);
        }
        if map.flash_size % map.page_size != 0 {
            bail!(
                "Flash size {:#x} is not a multiple of the page size {:#x}",
                map.flash_size,
                map.page_size
            );
        }
        if map.flash_size <= map.mbr_size {
            bail!("Flash size {:#x} leaves no room above the MBR", map.flash_size);
        }
        Ok(map)
    }

    /// Path the flash image is written to after the command.
    pub fn output_path(&self) -> Option<&PathBuf> {
        self.save.as_ref().or(self.flash.as_ref())
    }
}
