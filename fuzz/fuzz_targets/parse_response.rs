#![no_main]

use httpmsg::{parse_response, Body, Config, ResponseParser, Status};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = Config::default();

    let message = match parse_response(data, &config) {
        Ok(Status::Complete { message, .. }) => message,
        Ok(Status::Partial) => {
            // Close-delimited bodies complete at end of input.
            let mut parser = ResponseParser::new(config);
            match parser.finish(data) {
                Ok((message, _)) => message,
                Err(_) => return,
            }
        }
        Err(_) => return,
    };

    // A close-delimited body only ends with the connection.
    if matches!(message.body(), Body::UntilClose(_)) {
        return;
    }

    let bytes = message.to_bytes();
    match parse_response(&bytes, &config) {
        Ok(Status::Complete { message: again, consumed }) => {
            assert_eq!(consumed, bytes.len());
            assert_eq!(again, message);
        }
        other => panic!("reparse failed: {:?}", other),
    }
});
