// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use crate::test::{device, firmware_image, BANK1, SD_LEN};
    use emulator_periph::{DummyFlashCtrl, EmulatedMbr, FlashOperation, SoftDeviceState};
    use libsyscall_mbr::Mbr;
    use mbr_config::NrfMemoryMap;
    use nrf_mbr::MbrError;
    use tempfile::NamedTempFile;

    const SD_BASE: u32 = 0x1000;

    #[test]
    fn test_softdevice_update() {
        let mut mbr = device(false);
        let new_sd = firmware_image(10, SD_BASE, SD_LEN);
        mbr.supervisor_mut().load_words(BANK1, &new_sd).unwrap();
        assert_eq!(mbr.verify(BANK1, SD_BASE, SD_LEN), Ok(false));

        mbr.copy_softdevice(BANK1, SD_BASE, SD_LEN).unwrap();
        assert_eq!(mbr.verify(BANK1, SD_BASE, SD_LEN), Ok(true));

        let ops = mbr.supervisor_mut().flash_mut().take_operations();
        let erases = ops
            .iter()
            .filter(|op| matches!(op, FlashOperation::ErasePage { .. }))
            .count();
        assert_eq!(erases as u32, SD_LEN / 256);
        // Every page is erased before the first write lands.
        let first_program = ops
            .iter()
            .position(|op| matches!(op, FlashOperation::Program { .. }))
            .unwrap();
        assert_eq!(first_program, erases);

        mbr.start_softdevice().unwrap();
        assert_eq!(
            mbr.supervisor().softdevice(),
            SoftDeviceState::Running {
                vector_table: SD_BASE
            }
        );
        assert_eq!(mbr.start_softdevice(), Err(MbrError::InvalidState));
        assert_eq!(
            mbr.copy_softdevice(BANK1, SD_BASE, SD_LEN),
            Err(MbrError::InvalidState)
        );
    }

    #[test]
    fn test_softdevice_update_bad_length_leaves_flash() {
        let mut mbr = device(false);
        let before = mbr.supervisor().flash().as_bytes().to_vec();
        assert_eq!(
            mbr.copy_softdevice(BANK1, SD_BASE, SD_LEN + 1),
            Err(MbrError::InvalidLength)
        );
        assert_eq!(mbr.supervisor().flash().as_bytes(), &before[..]);
    }

    #[test]
    fn test_softdevice_update_failing_cell() {
        let mut mbr = device(false);
        let new_sd = firmware_image(11, SD_BASE, SD_LEN);
        mbr.supervisor_mut().load_words(BANK1, &new_sd).unwrap();

        let bad_word = SD_BASE + 0x2468;
        let expected = new_sd[((bad_word - SD_BASE) / 4) as usize];
        mbr.supervisor_mut()
            .flash_mut()
            .inject_stuck_bits(bad_word, !expected);

        assert_eq!(
            mbr.copy_softdevice(BANK1, SD_BASE, SD_LEN),
            Err(MbrError::Internal)
        );
        assert_eq!(mbr.verify(BANK1, SD_BASE, SD_LEN), Ok(false));
    }

    #[test]
    fn test_softdevice_survives_power_cycle() {
        let image_file = NamedTempFile::new().unwrap();
        let map = NrfMemoryMap::default();

        let mut mbr = device(false);
        let new_sd = firmware_image(12, SD_BASE, SD_LEN);
        mbr.supervisor_mut().load_words(BANK1, &new_sd).unwrap();
        mbr.copy_softdevice(BANK1, SD_BASE, SD_LEN).unwrap();
        // Power off: only the flash contents survive.
        mbr.into_inner()
            .into_flash()
            .save(image_file.path())
            .unwrap();

        let flash = DummyFlashCtrl::from_file(&map, image_file.path()).unwrap();
        let mut mbr = Mbr::new(EmulatedMbr::with_flash(map, flash));
        assert_eq!(
            mbr.supervisor().read_words(SD_BASE, SD_LEN).unwrap(),
            new_sd
        );
        mbr.start_softdevice().unwrap();
    }
}
