#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing and annotating must not panic on any input.
    if let Ok(report) = covcheck::parsers::simplecov::parse(data) {
        let _ = covcheck::annotate::Annotator::default().annotate_simplecov(&report, None);
    }
});
