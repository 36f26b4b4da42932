#![no_main]

use libfuzzer_sys::fuzz_target;
use relayctl::infrastructure::shell::snapshot::RecordReader;

fuzz_target!(|data: &[u8]| {
    // Host output is untrusted; decoding must reject, never panic
    if let Ok(output) = std::str::from_utf8(data) {
        let reader = RecordReader::new("fuzz");
        let _ = reader.probe(output);
        let _ = reader.snapshot(output);
        let _ = reader.files(output);
        let _ = reader.apply_report(output);
        let _ = reader.units(output);
        let _ = reader.service_status(output);
    }
});
