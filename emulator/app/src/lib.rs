/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Library interface for the nRF MBR emulator.

--*/

pub mod args;
pub mod emulator;

pub use args::{EmulatorArgs, LoadArg, MbrSubcommand};
pub use emulator::{run, Emulator, RunOutcome};
