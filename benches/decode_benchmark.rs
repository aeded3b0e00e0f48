use astra_rs::astra::checksum::crc16;
use astra_rs::astra::decoder::decode_reports;
use astra_rs::{
    decode_packet, packet_length, DeviceRecord, HandlerConfig, InMemoryDeviceDirectory,
    ProtocolVariant,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const REPORTS_TO_FOLLOW: u8 = 0x10;

/// Protocol K packet with `count` basic reports for TAC 35395108, serial 123456
fn k_packet(count: usize) -> Vec<u8> {
    let mut packet = vec![b'K', 0x00, 0x00];
    packet.extend_from_slice(&35_395_108u32.to_be_bytes());
    packet.extend_from_slice(&123_456u32.to_be_bytes()[1..]);
    for i in 0..count {
        let mut report = [0u8; 38];
        report[0] = i as u8;
        report[1..5].copy_from_slice(&51_507_400i32.to_be_bytes());
        report[13] = 20; // speed
        report[17] = 0x02; // reason: distance travelled
        if i + 1 < count {
            report[19] = REPORTS_TO_FOLLOW;
        }
        packet.extend_from_slice(&report);
    }
    let total = (packet.len() + 2) as u16;
    packet[1..3].copy_from_slice(&total.to_be_bytes());
    let crc = crc16(&packet);
    packet.extend_from_slice(&crc.to_be_bytes());
    packet
}

fn benchmark_crc16(c: &mut Criterion) {
    let data = k_packet(26);
    c.bench_function("crc16_1k", |b| b.iter(|| crc16(black_box(&data))));
}

fn benchmark_framing(c: &mut Criterion) {
    let data = k_packet(1);
    c.bench_function("packet_length", |b| {
        b.iter(|| packet_length(black_box(&data[..3])))
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let config = HandlerConfig::default();
    let directory = InMemoryDeviceDirectory::with_devices([DeviceRecord::new(
        "bench",
        "k1",
        "astra_35395108123456",
    )]);

    let mut group = c.benchmark_group("decode_packet");
    for count in [1usize, 8, 26] {
        let data = k_packet(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| decode_packet(black_box(data), &config, &directory))
        });
    }
    group.finish();

    let data = k_packet(26);
    c.bench_function("decode_reports_no_raw_data", |b| {
        b.iter(|| decode_reports(ProtocolVariant::K, black_box(&data), false))
    });
}

criterion_group!(benches, benchmark_crc16, benchmark_framing, benchmark_decode);
criterion_main!(benches);
