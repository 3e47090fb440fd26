#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split = usize::from(data[0]).min(data.len() - 1);
    let (format, input) = data[1..].split_at(split);

    let bytes = fmtscan::scan(format, input);
    if let Ok(specs) = fmtscan::Specifiers::decode(format, input.len(), fmtscan::TextMode::Byte) {
        let values = bytes.unwrap();
        assert!(values.len() <= specs.targets().len());
        assert_eq!(values.len(), specs.scan(input).len());
    } else {
        assert!(bytes.is_err());
    }

    let input = String::from_utf8_lossy(input);
    let _ = fmtscan::scan(format, &*input);
});
