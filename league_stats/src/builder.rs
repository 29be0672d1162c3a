use std::collections::HashSet;

use chrono::NaiveDateTime;

pub use crate::config::*;

/// A builder for assembling a season.
///
/// Competitor and round ids must be unique. Submissions and votes are not
/// checked against them: dangling references are tolerated by the analysis.
///
/// ```
/// use chrono::NaiveDate;
/// use league_stats::builder::SeasonBuilder;
/// # use league_stats::StatsErrors;
///
/// let created = NaiveDate::from_ymd_opt(2024, 1, 5)
///     .unwrap()
///     .and_hms_opt(20, 0, 0)
///     .unwrap();
///
/// let mut builder = SeasonBuilder::new();
/// builder.add_competitor(1, "Ann")?;
/// builder.add_competitor(2, "Ben")?;
/// builder.add_round(10, "Covers", created)?;
/// builder.add_submission_simple("spotify:track:1", 10, 1, "Song A", "Artist X, Guest");
/// builder.add_vote_simple("spotify:track:1", 10, 2, 5);
///
/// let season = builder.build();
/// assert_eq!(season.votes().len(), 1);
/// # Ok::<(), StatsErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SeasonBuilder {
    pub(crate) _competitors: Vec<Competitor>,
    pub(crate) _rounds: Vec<Round>,
    pub(crate) _submissions: Vec<Submission>,
    pub(crate) _votes: Vec<Vote>,
    competitor_ids: HashSet<CompetitorId>,
    round_ids: HashSet<RoundId>,
}

impl SeasonBuilder {
    pub fn new() -> SeasonBuilder {
        SeasonBuilder::default()
    }

    pub fn add_competitor(&mut self, id: CompetitorId, name: &str) -> Result<(), StatsErrors> {
        if !self.competitor_ids.insert(id) {
            return Err(StatsErrors::DuplicateCompetitorId(id));
        }
        self._competitors.push(Competitor {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn add_round(
        &mut self,
        id: RoundId,
        name: &str,
        created_at: NaiveDateTime,
    ) -> Result<(), StatsErrors> {
        if !self.round_ids.insert(id) {
            return Err(StatsErrors::DuplicateRoundId(id));
        }
        self._rounds.push(Round {
            id,
            name: name.to_string(),
            created_at,
        });
        Ok(())
    }

    pub fn add_submission_simple(
        &mut self,
        spotify_uri: &str,
        round_id: RoundId,
        submitter_id: CompetitorId,
        title: &str,
        artists: &str,
    ) {
        self.add_submission(Submission {
            spotify_uri: spotify_uri.to_string(),
            round_id,
            submitter_id,
            title: title.to_string(),
            artists: artists.to_string(),
        })
    }

    pub fn add_submission(&mut self, submission: Submission) {
        self._submissions.push(submission);
    }

    pub fn add_vote_simple(
        &mut self,
        spotify_uri: &str,
        round_id: RoundId,
        voter_id: CompetitorId,
        points: u64,
    ) {
        self.add_vote(Vote {
            spotify_uri: spotify_uri.to_string(),
            round_id,
            voter_id,
            points_assigned: Points(points),
        })
    }

    pub fn add_vote(&mut self, vote: Vote) {
        self._votes.push(vote);
    }

    pub fn build(self) -> Season {
        Season {
            competitors: self._competitors,
            rounds: self._rounds,
            submissions: self._submissions,
            votes: self._votes,
        }
    }
}
