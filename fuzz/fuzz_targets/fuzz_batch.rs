#![no_main]

use difal::batch::{BatchConfig, Document, MemoryStore, process_batch};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut store = MemoryStore::new();
    let docs = vec![
        Document::new("a.xml", data.to_vec()),
        Document::new("b.xml", data.to_vec()),
    ];
    // Feeding the same bytes twice exercises the existing-client path.
    match process_batch(&mut store, &docs, &BatchConfig::default()) {
        Ok(report) => {
            let _ = report.to_json();
        }
        Err(failure) => {
            let _ = failure.to_json();
        }
    }
});
