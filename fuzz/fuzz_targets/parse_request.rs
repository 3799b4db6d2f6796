#![no_main]

use httpmsg::{parse_request, Config, Status};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = Config::default();

    let Ok(Status::Complete { message, .. }) = parse_request(data, &config) else {
        return;
    };

    // Anything accepted must survive a write and reparse unchanged.
    let bytes = message.to_bytes();
    match parse_request(&bytes, &config) {
        Ok(Status::Complete { message: again, consumed }) => {
            assert_eq!(consumed, bytes.len());
            assert_eq!(again, message);
        }
        other => panic!("reparse failed: {:?}", other),
    }
});
