#![no_main]
use libfuzzer_sys::fuzz_target;
use packwrap::{Decoder, ExtType};

fuzz_target!(|data: &[u8]| {
    for engine in [ExtType::Lz4, ExtType::Zstd] {
        let _ = Decoder::new().engine(engine).max_size(1 << 20).unframe(data);
    }
});
