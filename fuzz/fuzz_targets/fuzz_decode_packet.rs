#![no_main]

use astra_rs::astra::checksum::append_checksum;
use astra_rs::{decode_packet, DeviceRecord, HandlerConfig, InMemoryDeviceDirectory};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = HandlerConfig::default();
    let directory = InMemoryDeviceDirectory::with_devices([DeviceRecord::new(
        "fuzz",
        "tracker",
        "astra_35395108123456",
    )]);

    // Raw input mostly stops at the checksum
    let _ = decode_packet(data, &config, &directory);

    // Reseal with a valid length and CRC so report decoding is reached
    if data.len() >= 10 && data.len() <= 1022 {
        let mut packet = data.to_vec();
        packet[0] = [b'C', b'K', b'M'][usize::from(data[0]) % 3];
        let total = (packet.len() + 2) as u16;
        packet[1..3].copy_from_slice(&total.to_be_bytes());
        packet[3..10].copy_from_slice(&[0x02, 0x1C, 0x16, 0x24, 0x01, 0xE2, 0x40]);
        append_checksum(&mut packet);
        let _ = decode_packet(&packet, &config, &directory);
    }
});
