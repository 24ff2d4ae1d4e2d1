#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: &str| {
    let parsed = kotlite::parse(source);
    if parsed.is_clean() {
        assert!(!parsed.script.statements.is_empty());
    }
});
