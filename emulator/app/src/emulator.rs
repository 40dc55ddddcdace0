/*++

Licensed under the Apache-2.0 license.

File Name:

    emulator.rs

Abstract:

    Runs one MBR command against flash image files.

--*/

use crate::args::EmulatorArgs;
use anyhow::{Context, Result};
use emulator_periph::{BootJump, DummyFlashCtrl, EmulatedMbr};
use log::{debug, info};
use nrf_mbr::{MbrCommand, Supervisor};

/// What happened when the command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Raw `nrf_error.h` status returned by the MBR.
    pub status: u32,
    pub boot_jump: Option<BootJump>,
}

pub struct Emulator {
    mbr: EmulatedMbr,
}

impl Emulator {
    pub fn from_args(cli: &EmulatorArgs) -> Result<Self> {
        let map = cli.memory_map()?;
        debug!("Memory map: {:?}", map.hash_map());
        let flash = match &cli.flash {
            Some(path) => DummyFlashCtrl::from_file(&map, path)
                .with_context(|| format!("Failed to open flash image {}", path.display()))?,
            None => DummyFlashCtrl::new(&map),
        };
        let mut mbr = EmulatedMbr::with_flash(map, flash);
        mbr.uicr_mut().set_bootaddr(cli.bootaddr);

        for load in &cli.load {
            let bytes = std::fs::read(&load.path)
                .with_context(|| format!("Failed to read {}", load.path.display()))?;
            mbr.load(load.addr, &bytes).with_context(|| {
                format!("Failed to load {} at {:#x}", load.path.display(), load.addr)
            })?;
            info!(
                "Loaded {} ({} bytes) at {:#010x}",
                load.path.display(),
                bytes.len(),
                load.addr
            );
        }
        Ok(Self { mbr })
    }

    pub fn mbr(&self) -> &EmulatedMbr {
        &self.mbr
    }

    /// Issues the command as a raw supervisor call.
    pub fn run(&mut self, cmd: &MbrCommand) -> RunOutcome {
        let mut raw = cmd.to_raw();
        let status = self.mbr.sd_mbr_command(&mut raw);
        RunOutcome {
            status,
            boot_jump: self.mbr.take_boot_jump(),
        }
    }

    pub fn save(&self, cli: &EmulatorArgs) -> Result<()> {
        if let Some(path) = cli.output_path() {
            self.mbr
                .flash()
                .save(path)
                .with_context(|| format!("Failed to write flash image {}", path.display()))?;
            info!("Saved flash image to {}", path.display());
        }
        Ok(())
    }
}

/// Builds the emulator, runs the command line's command and saves the flash.
pub fn run(cli: &EmulatorArgs) -> Result<RunOutcome> {
    let mut emulator = Emulator::from_args(cli)?;
    let outcome = emulator.run(&MbrCommand::from(&cli.command));
    emulator.save(cli)?;
    Ok(outcome)
}
