#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(signature) = hijackscan::codesign::parse_embedded_signature(data) {
        if let Some(plist) = signature.entitlements {
            let _ = hijackscan::codesign::Entitlements::from_plist(&plist);
        }
    }
});
