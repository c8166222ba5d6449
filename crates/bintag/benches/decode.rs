use bintag::{ByteOrder, Decoder, decode_be, record, tag};
use criterion::{Criterion, criterion_group, criterion_main};

#[derive(Default)]
struct Entry {
    id: u32,
    flags: u16,
    name_len: u8,
    name: String,
    values: Vec<i16>,
}

record!(Entry {
    id: "",
    flags: "le",
    name_len: "",
    name: "len:name_len",
    values: "len:4",
});

#[derive(Default)]
struct Table {
    count: u16,
    entries: Vec<Entry>,
}

record!(Table {
    count: "",
    entries: "len:count",
});

fn gen_table(entry_count: usize) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&(entry_count as u16).to_be_bytes());

    // Deterministic but non-trivial pattern
    for i in 0..entry_count {
        data.extend_from_slice(&(i as u32).to_be_bytes());
        data.extend_from_slice(&((i * 31 % 65536) as u16).to_le_bytes());
        data.push(8);
        data.extend_from_slice(format!("entry{:03}", i % 1000).as_bytes());
        for v in 0..4i16 {
            data.extend_from_slice(&(v * i as i16).to_be_bytes());
        }
    }

    data
}

fn bench_tag_parse(c: &mut Criterion) {
    c.bench_function("parse_tag", |b| {
        b.iter(|| tag::parse("len:Size - 2, offsetStart:Base + 8, [le, len:4, [Custom]], be").unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    for &entry_count in &[1usize, 10, 100, 1000] {
        let data = gen_table(entry_count);

        c.bench_function(&format!("decode_{}_entries", entry_count), |b| {
            b.iter(|| {
                let mut table = Table::default();
                decode_be(&data, &mut table).unwrap();
                table
            })
        });
    }
}

fn bench_decoder_stream(c: &mut Criterion) {
    let data = gen_table(100);

    c.bench_function("decoder_stream_100_entries", |b| {
        b.iter(|| {
            let mut decoder = Decoder::from_bytes(&data, ByteOrder::Big);
            let mut table = Table::default();
            decoder.decode(&mut table).unwrap();
            table
        })
    });
}

criterion_group!(benches, bench_tag_parse, bench_decode, bench_decoder_stream);
criterion_main!(benches);
