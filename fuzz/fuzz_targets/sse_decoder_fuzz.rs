//! Fuzz test for the event-stream decoder.
//!
//! Feeds arbitrary bytes split at an arbitrary point and checks that the
//! decoder never panics and that chunking does not change what it emits.
//!
//! Run with: cargo +nightly fuzz run sse_decoder_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use podium_tui::sse::SseDecoder;

fuzz_target!(|data: &[u8]| {
    let Some((&split, body)) = data.split_first() else {
        return;
    };

    let whole = SseDecoder::new().feed(body);

    let cut = if body.is_empty() {
        0
    } else {
        split as usize % (body.len() + 1)
    };
    let mut decoder = SseDecoder::new();
    let mut pieces = decoder.feed(&body[..cut]);
    pieces.extend(decoder.feed(&body[cut..]));

    assert_eq!(whole, pieces, "chunk boundary changed decoded events");
    for event in &whole {
        assert!(!event.id.as_deref().unwrap_or("").contains('\0'), "NUL accepted in event id");
    }
});
