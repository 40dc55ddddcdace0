// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use crate::test::{device, firmware_image, BANK1, BL_LEN, BOOTADDR, SD_LEN};
    use clap::Parser;
    use emulator::{EmulatorArgs, RunOutcome};
    use emulator_periph::{BootJump, SoftDeviceState};
    use nrf_mbr::{MbrError, NRF_SUCCESS};
    use std::fs;
    use zerocopy::IntoBytes;

    const SD_BASE: u32 = 0x1000;

    #[test]
    fn test_bootloader_update() {
        let mut mbr = device(true);
        let new_bl = firmware_image(20, BOOTADDR, BL_LEN);
        mbr.supervisor_mut().load_words(BANK1, &new_bl).unwrap();
        let below = mbr.supervisor().read_words(0, BOOTADDR / 4).unwrap();

        // Returns on the host only; a device resets into the new image.
        mbr.copy_bootloader(BANK1, BL_LEN).unwrap();

        let emulated = mbr.supervisor_mut();
        assert_eq!(emulated.read_words(BOOTADDR, BL_LEN).unwrap(), new_bl);
        assert_eq!(emulated.read_words(0, BOOTADDR / 4).unwrap(), below);
        assert_eq!(
            emulated.take_boot_jump(),
            Some(BootJump {
                stack_pointer: new_bl[0],
                reset_vector: new_bl[1],
            })
        );
        assert!(!emulated.flash().is_protected(0));
    }

    #[test]
    fn test_bootloader_update_without_bootaddr() {
        let mut mbr = device(false);
        mbr.supervisor_mut()
            .load_words(BANK1, &firmware_image(21, BOOTADDR, BL_LEN))
            .unwrap();
        let before = mbr.supervisor().flash().as_bytes().to_vec();

        assert_eq!(
            mbr.copy_bootloader(BANK1, BL_LEN),
            Err(MbrError::Forbidden)
        );
        assert_eq!(mbr.supervisor().flash().as_bytes(), &before[..]);
        assert_eq!(mbr.supervisor().boot_jump(), None);
    }

    #[test]
    fn test_bootloader_update_with_softdevice_running() {
        let mut mbr = device(true);
        mbr.start_softdevice().unwrap();
        assert_eq!(
            mbr.copy_bootloader(BANK1, BL_LEN),
            Err(MbrError::InvalidState)
        );
    }

    #[test]
    fn test_full_dfu() {
        let mut mbr = device(true);
        let new_sd = firmware_image(22, SD_BASE, SD_LEN);
        let new_bl = firmware_image(23, BOOTADDR, BL_LEN);
        let bl_bank = BANK1 + SD_LEN * 4;
        mbr.supervisor_mut().load_words(BANK1, &new_sd).unwrap();
        mbr.supervisor_mut().load_words(bl_bank, &new_bl).unwrap();

        mbr.copy_softdevice(BANK1, SD_BASE, SD_LEN).unwrap();
        mbr.copy_bootloader(bl_bank, BL_LEN).unwrap();
        assert!(mbr.supervisor_mut().take_boot_jump().is_some());

        // The new bootloader brings the new SoftDevice up.
        assert_eq!(mbr.supervisor().softdevice(), SoftDeviceState::Stopped);
        assert_eq!(mbr.verify(BANK1, SD_BASE, SD_LEN), Ok(true));
        assert_eq!(mbr.verify(bl_bank, BOOTADDR, BL_LEN), Ok(true));
        mbr.start_softdevice().unwrap();
    }

    #[test]
    fn test_bootloader_update_from_cli() {
        crate::test::init_logger();
        let dir = tempfile::tempdir().unwrap();
        let flash = dir.path().join("flash.bin");
        let bl = dir.path().join("bl.bin");
        let new_bl = firmware_image(24, BOOTADDR, BL_LEN);
        fs::write(&bl, new_bl.as_bytes()).unwrap();

        let args = [
            "emulator".to_string(),
            "--flash".to_string(),
            flash.display().to_string(),
            "--bootaddr".to_string(),
            format!("{:#x}", BOOTADDR),
            "--load".to_string(),
            format!("{}@{:#x}", bl.display(), BANK1),
            "copy-bl".to_string(),
            "--src".to_string(),
            format!("{:#x}", BANK1),
            "--len".to_string(),
            format!("{:#x}", BL_LEN),
        ];
        let cli = EmulatorArgs::try_parse_from(args).unwrap();
        let RunOutcome { status, boot_jump } = emulator::run(&cli).unwrap();
        assert_eq!(status, NRF_SUCCESS);
        assert_eq!(boot_jump.map(|j| j.reset_vector), Some(new_bl[1]));

        let saved = fs::read(&flash).unwrap();
        let start = BOOTADDR as usize;
        assert_eq!(
            &saved[start..start + BL_LEN as usize * 4],
            new_bl.as_bytes()
        );
    }
}
