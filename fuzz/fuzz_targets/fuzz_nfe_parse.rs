#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any outcome is fine; panics are bugs.
    if let difal::nfe::ParseOutcome::Parsed(parsed) = difal::nfe::parse_nfe(data) {
        let _ = difal::summarize_invoice(&parsed.record);
    }
});
