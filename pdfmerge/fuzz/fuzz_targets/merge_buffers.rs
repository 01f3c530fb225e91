#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfmerge::validation::Validator;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must be rejected with an error, never a panic.
    if Validator::new().validate(data).is_err() {
        return;
    }

    // Anything the validator accepts must merge, alone and twice over.
    let merged = pdfmerge::merge(&[data]).expect("validated input should merge");
    pdfmerge::merge(&[data, data]).expect("validated input should merge twice");
    assert!(Validator::new().validate(&merged).is_ok());
});
