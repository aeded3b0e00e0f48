#![no_main]

use astra_rs::{packet_length, StreamFramer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = packet_length(data);

    // Feed the stream in uneven chunks, dropping buffered bytes on errors
    let mut framer = StreamFramer::new();
    let step = usize::from(data.first().copied().unwrap_or(1)).max(1);
    for chunk in data.chunks(step) {
        framer.push(chunk);
        while let Ok(Some((variant, packet))) = framer.next_packet() {
            assert_eq!(packet[0], variant.identifier());
        }
    }
});
