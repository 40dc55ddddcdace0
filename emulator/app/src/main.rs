/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the nRF MBR emulator.

--*/

use clap::Parser;
use emulator::EmulatorArgs;
use log::LevelFilter;
use nrf_mbr::status_name;
use simple_logger::SimpleLogger;

fn main() -> anyhow::Result<()> {
    let cli = EmulatorArgs::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    SimpleLogger::new().with_level(level).init()?;

    let outcome = emulator::run(&cli)?;
    if let Some(jump) = outcome.boot_jump {
        println!(
            "Reset into bootloader: sp={:#010x} pc={:#010x}",
            jump.stack_pointer, jump.reset_vector
        );
    }
    println!("{}", status_name(outcome.status));
    std::process::exit(outcome.status as i32);
}
