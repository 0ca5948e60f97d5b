#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Exercise the field codec directly: first byte is the type code.
    if let Some((ty, value)) = data.split_first() {
        let _ = icf_core::_fuzz_apply_field(*ty, value);
    }
});
