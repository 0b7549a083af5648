#![no_main]

use raster_convert::data_url;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(payload) = data_url::decode(text) {
        let again = data_url::encode(&payload.bytes, Some(&payload.media_type));
        let reparsed = data_url::decode(&again).expect("re-encoded payload must decode");
        assert_eq!(reparsed.bytes, payload.bytes);
    }
});
