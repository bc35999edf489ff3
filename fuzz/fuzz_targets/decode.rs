#![no_main]

use libfuzzer_sys::fuzz_target;
use tunpeek::decode::decode;

fuzz_target!(|data: &[u8]| {
    let first = decode(data);
    assert_eq!(first, decode(data));

    if let Ok(report) = first {
        let _trace = report.to_string();
        if report.ports().is_some() {
            assert!(data.len() >= usize::from(report.ihl) * 4 + 8);
        }
    }
});
