#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parsing and annotating must not panic on any input.
    if let Ok(report) = covcheck::parsers::jacoco::parse(data) {
        let changed = vec!["src/Main.java".to_string()];
        let _ = covcheck::annotate::Annotator::default().annotate_jacoco(&report, &changed);
    }
});
