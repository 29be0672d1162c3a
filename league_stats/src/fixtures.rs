// Seasons shared by the unit tests.

use chrono::{NaiveDate, NaiveDateTime};

pub use crate::builder::SeasonBuilder;
use crate::*;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, d)
        .unwrap()
        .and_hms_opt(20, 0, 0)
        .unwrap()
}

/// Ann submits one song in one round, Ben gives it 5 points.
pub fn single_vote_season_data() -> Season {
    let mut b = SeasonBuilder::new();
    b.add_competitor(1, "Ann").unwrap();
    b.add_competitor(2, "Ben").unwrap();
    b.add_round(10, "R1", day(1)).unwrap();
    b.add_submission_simple("u1", 10, 1, "Song A", "Artist X");
    b.add_vote_simple("u1", 10, 2, 5);
    b.build()
}

/// Ann submits one song nobody votes for, Ben submits nothing.
pub fn lone_snub_season() -> Season {
    let mut b = SeasonBuilder::new();
    b.add_competitor(1, "Ann").unwrap();
    b.add_competitor(2, "Ben").unwrap();
    b.add_round(10, "R1", day(1)).unwrap();
    b.add_submission_simple("u1", 10, 1, "Song A", "Artist X");
    b.build()
}

/// Four competitors, three rounds.
///
/// Dan never submits and skips the last round. Ben does not submit in the
/// last round. Ann resubmits "Song A" in the last round under another track.
/// Rounds are not given in chronological order.
pub fn small_season_builder() -> SeasonBuilder {
    let mut b = SeasonBuilder::new();
    b.add_competitor(1, "Ann").unwrap();
    b.add_competitor(2, "Ben").unwrap();
    b.add_competitor(3, "Cat").unwrap();
    b.add_competitor(4, "Dan").unwrap();

    b.add_round(11, "Nineties", day(8)).unwrap();
    b.add_round(10, "Covers", day(1)).unwrap();
    b.add_round(12, "Guilty Pleasures", day(15)).unwrap();

    b.add_submission_simple("u1", 10, 1, "Song A", "Artist X, Feat Y");
    b.add_submission_simple("u2", 10, 2, "Song B", "Artist Z");
    b.add_submission_simple("u3", 10, 3, "Song C", "Artist X");
    b.add_submission_simple("u4", 11, 1, "Song D", "Artist W");
    b.add_submission_simple("u5", 11, 2, "Song E", " Artist X ");
    b.add_submission_simple("u6", 11, 3, "Song F", "Artist V");
    b.add_submission_simple("u7", 12, 1, "Song A", "Artist X");
    b.add_submission_simple("u8", 12, 3, "Song G", "Artist Z");

    // Covers: everybody spends 5 points.
    b.add_vote_simple("u2", 10, 1, 3);
    b.add_vote_simple("u3", 10, 1, 2);
    b.add_vote_simple("u1", 10, 2, 4);
    b.add_vote_simple("u3", 10, 2, 1);
    b.add_vote_simple("u1", 10, 3, 2);
    b.add_vote_simple("u2", 10, 3, 3);
    b.add_vote_simple("u1", 10, 4, 5);
    // Nineties: everybody spends 5 points, nobody votes for Ann.
    b.add_vote_simple("u5", 11, 1, 5);
    b.add_vote_simple("u6", 11, 2, 5);
    b.add_vote_simple("u5", 11, 3, 5);
    b.add_vote_simple("u5", 11, 4, 3);
    b.add_vote_simple("u6", 11, 4, 2);
    // Guilty Pleasures: Dan does not vote, Cat only spends 1 point.
    b.add_vote_simple("u8", 12, 1, 5);
    b.add_vote_simple("u8", 12, 2, 5);
    b.add_vote_simple("u7", 12, 3, 1);
    b
}

pub fn small_season() -> Season {
    small_season_builder().build()
}
