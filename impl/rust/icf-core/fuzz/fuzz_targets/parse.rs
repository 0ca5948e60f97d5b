#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any bytes; the decoder must not panic and must never report success
    // without consuming the whole buffer.
    if let Ok(d) = icf_core::Decoder::default().decode(data) {
        assert_eq!(d.consumed, data.len());
        assert!(d.signed_len <= data.len());
    }
});
