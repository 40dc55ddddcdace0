// Licensed under the Apache-2.0 license

mod test_bootloader_update;
mod test_softdevice_update;

#[cfg(test)]
mod test {
    use emulator_periph::EmulatedMbr;
    use libsyscall_mbr::Mbr;
    use log::LevelFilter;
    use mbr_config::NrfMemoryMap;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use simple_logger::SimpleLogger;

    /// Size of the installed SoftDevice in words.
    pub const SD_LEN: u32 = 28 * 256;
    /// Bank the DFU process stages new images in.
    pub const BANK1: u32 = 0x2_0000;
    pub const BOOTADDR: u32 = 0x3_a000;
    pub const BL_LEN: u32 = 0x1800;

    pub fn init_logger() {
        let _ = SimpleLogger::new().with_level(LevelFilter::Debug).init();
    }

    /// A random firmware image whose vector table points into itself.
    pub fn firmware_image(seed: u64, base: u32, len: u32) -> Vec<u32> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut image: Vec<u32> = (0..len).map(|_| rng.gen()).collect();
        image[0] = 0x2000_4000;
        image[1] = (base + rng.gen_range(0x100..len * 4)) | 1;
        image
    }

    /// A device with an MBR, an installed SoftDevice and, optionally, a bootloader.
    pub fn device(bootloader: bool) -> Mbr<EmulatedMbr> {
        init_logger();
        let map = NrfMemoryMap::default();
        let mut mbr = EmulatedMbr::new(map);
        mbr.load_words(map.softdevice_base(), &firmware_image(1, map.softdevice_base(), SD_LEN))
            .unwrap();
        if bootloader {
            mbr.uicr_mut().set_bootaddr(Some(BOOTADDR));
            mbr.load_words(BOOTADDR, &firmware_image(2, BOOTADDR, BL_LEN))
                .unwrap();
        }
        mbr.flash_mut().take_operations();
        Mbr::new(mbr)
    }
}
