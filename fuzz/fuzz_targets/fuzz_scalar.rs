#![no_main]
use libfuzzer_sys::fuzz_target;

// Every numeric conversion over arbitrary input, with and without widths
const FORMAT: &str = "%i %d %u %o %x %p %f %lf %La %n %3hhd %2c %[0-9a-f] %*s %lln";

fuzz_target!(|data: &[u8]| {
    let values = fmtscan::scan(FORMAT, data).unwrap();
    assert!(values.len() <= 14);
    for value in values {
        let _ = value.to_string();
    }
});
