#![no_main]

use httpmsg::RequestTarget;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(target) = RequestTarget::parse(s) else {
        return;
    };

    let again = RequestTarget::parse(&target.to_string()).expect("reparse");
    assert_eq!(again, target);
});
