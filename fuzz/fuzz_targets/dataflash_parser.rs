#![no_main]

use ekf_bias::dataflash::{decode_records, DataFlashParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Neither the raw parser nor record conversion may panic on any input
    let mut parser = DataFlashParser::new(data);
    for message in parser.by_ref() {
        let _ = message.to_record();
    }
    assert!(parser.stats().skipped_bytes as usize <= data.len());

    let _ = decode_records(data);
});
