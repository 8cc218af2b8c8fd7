#![no_main]
use libfuzzer_sys::fuzz_target;
use wbxml_pack::{decode, encode};

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = decode(data) {
        let bytes = encode(&doc).expect("decoded document failed to encode");
        let again = decode(&bytes).expect("re-encoded document failed to decode");
        assert_eq!(again, doc);
    }
});
