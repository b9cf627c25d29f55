//! Fuzz test for the pushed leaderboard payload parser.
//!
//! Any accepted payload must come back rank-ordered with no zero ranks.
//!
//! Run with: cargo +nightly fuzz run snapshot_parse_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use podium_core::LeaderboardSnapshot;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(snapshot) = LeaderboardSnapshot::parse(payload) {
        let ranks: Vec<u32> = snapshot.iter().map(|t| t.rank).collect();
        assert!(ranks.iter().all(|&r| r >= 1), "rank 0 accepted");
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "snapshot not rank ordered");
    }
});
