#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Overflowing amounts must come back as errors, never panics.
    if let Ok(doc) = comprobante::xml::parse_bytes(data) {
        let _ = doc.summarize();
    }
});
