// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::ops::{Add, AddAssign};

use chrono::NaiveDateTime;

pub type CompetitorId = i64;
pub type RoundId = i64;

/// A number of points assigned by voters. Points are never negative.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct Points(pub u64);

impl Points {
    pub const EMPTY: Points = Points(0);

    /// Subtraction that refuses to go below zero.
    pub fn checked_sub(self, rhs: Points) -> Option<Points> {
        self.0.checked_sub(rhs.0).map(Points)
    }
}

impl std::iter::Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Points(iter.map(|p| p.0).sum())
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        self.0 += rhs.0;
    }
}

impl Add for Points {
    type Output = Points;
    fn add(self: Points, rhs: Points) -> Points {
        Points(self.0 + rhs.0)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Round {
    pub id: RoundId,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// One track entered by one competitor into one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Submission {
    pub spotify_uri: String,
    pub round_id: RoundId,
    pub submitter_id: CompetitorId,
    pub title: String,
    /// Comma-separated list of artists, the first one being the primary artist.
    pub artists: String,
}

impl Submission {
    /// The first entry of the artist list, without surrounding whitespace.
    pub fn primary_artist(&self) -> &str {
        self.artists.split(',').next().unwrap_or("").trim()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Vote {
    pub spotify_uri: String,
    pub round_id: RoundId,
    pub voter_id: CompetitorId,
    pub points_assigned: Points,
}

/// The four relations of a season. Read-only once built.
///
/// Use [crate::builder::SeasonBuilder] to construct one.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Season {
    pub(crate) competitors: Vec<Competitor>,
    pub(crate) rounds: Vec<Round>,
    pub(crate) submissions: Vec<Submission>,
    pub(crate) votes: Vec<Vote>,
}

impl Season {
    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParticipationRow {
    pub round_id: RoundId,
    pub round: String,
    pub created_at: NaiveDateTime,
    pub unique_submitters: usize,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LeaderboardRow {
    pub username: String,
    pub total_points: Points,
}

/// Zero-vote statistics for one submitter.
#[derive(PartialEq, Debug, Clone)]
pub struct SnubStats {
    pub username: String,
    pub zero_vote_songs: usize,
    pub total_submissions: usize,
    /// Percentage, rounded to one decimal.
    pub snub_rate: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RankedSnub {
    pub rank: usize,
    pub stats: SnubStats,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SnubReport {
    /// Submitters with enough submissions, by decreasing snub rate.
    pub ranked: Vec<RankedSnub>,
    /// Every submitter with at least one zero-vote song, by decreasing count.
    pub unranked: Vec<SnubStats>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExplorerRow {
    pub round_name: Option<String>,
    pub username: Option<String>,
    pub song_name: String,
    pub artist_name: String,
    pub number_of_votes: Points,
}

/// Equality filters over the explorer rows. `None` means "All".
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ExplorerFilter {
    pub username: Option<String>,
    pub round: Option<String>,
}

impl ExplorerFilter {
    pub const ALL: ExplorerFilter = ExplorerFilter {
        username: None,
        round: None,
    };

    pub fn matches(&self, row: &ExplorerRow) -> bool {
        let user_ok = match &self.username {
            Some(u) => row.username.as_deref() == Some(u.as_str()),
            None => true,
        };
        let round_ok = match &self.round {
            Some(r) => row.round_name.as_deref() == Some(r.as_str()),
            None => true,
        };
        user_ok && round_ok
    }
}

/// The values offered by the explorer filters, sorted and deduplicated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExplorerOptions {
    pub usernames: Vec<String>,
    pub rounds: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SongRow {
    pub round_name: Option<String>,
    pub song_name: String,
    pub artist_name: String,
    pub total_points: Points,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SupporterRow {
    pub voter: Option<String>,
    pub points_given: Points,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PlayerProfile {
    pub player_id: CompetitorId,
    pub username: String,
    pub submissions: usize,
    pub total_points: Points,
    pub average_points: f64,
    pub top_songs: Vec<SongRow>,
    pub bottom_songs: Vec<SongRow>,
    pub supporters: Vec<SupporterRow>,
}

/// What one competitor did with their voting power in one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HateRoundStats {
    pub round_id: RoundId,
    pub round_name: String,
    pub voting_power: Points,
    pub points_to_player: Points,
    pub hate_points: Points,
    pub participated: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct HaterRow {
    pub hater_id: CompetitorId,
    pub username: String,
    pub hate_points: Points,
    /// Voting power over the rounds this competitor took part in.
    pub voting_power: Points,
    pub hate_percent: f64,
    pub rounds: Vec<HateRoundStats>,
}

#[derive(PartialEq, Debug, Clone)]
pub enum HateReport {
    Haters(Vec<HaterRow>),
    /// Nobody went over the hate threshold.
    NoMeaningfulHaters,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AllocationRow {
    pub voter_id: CompetitorId,
    pub voter: String,
    pub total_points_used: Points,
    pub points_to_player: Points,
    pub hate_points: Points,
    pub share_percent: f64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ArtistCount {
    pub artist: String,
    pub submission_count: usize,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SongCount {
    pub song: String,
    /// Empty when counting by title only.
    pub artist: String,
    pub submission_count: usize,
}

/// Points from each voter to each submitter over the season.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoteMatrix {
    pub voters: Vec<String>,
    pub submitters: Vec<String>,
    /// One row per voter, one column per submitter.
    pub cells: Vec<Vec<Points>>,
}

impl VoteMatrix {
    pub fn get(&self, voter: &str, submitter: &str) -> Option<Points> {
        let row = self.voters.iter().position(|v| v == voter)?;
        let col = self.submitters.iter().position(|s| s == submitter)?;
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct MetricsSummary {
    pub total_votes: usize,
    pub total_submissions: usize,
    pub total_competitors: usize,
    pub average_points_per_song: f64,
    pub average_points_per_voter: f64,
    pub top_artists: Vec<ArtistCount>,
    /// (title, primary artist) pairs submitted more than once.
    pub repeated_songs: Vec<SongCount>,
    pub top_titles: Vec<SongCount>,
    pub matrix: VoteMatrix,
}

/// Errors that prevent an analysis from completing.
///
/// Missing references, empty denominators, ambiguous player names and
/// inconsistent subtotals are not errors: they are logged and degraded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum StatsErrors {
    DuplicateCompetitorId(CompetitorId),
    DuplicateRoundId(RoundId),
    UnknownPlayer(String),
    AnalysisTooLarge { cells: usize, limit: usize },
}

impl Error for StatsErrors {}

impl Display for StatsErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsErrors::DuplicateCompetitorId(id) => write!(f, "duplicate competitor id {}", id),
            StatsErrors::DuplicateRoundId(id) => write!(f, "duplicate round id {}", id),
            StatsErrors::UnknownPlayer(name) => write!(f, "no competitor named {:?}", name),
            StatsErrors::AnalysisTooLarge { cells, limit } => write!(
                f,
                "hate point analysis needs {} player-round cells, the limit is {}",
                cells, limit
            ),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisRules {
    /// Submitters with fewer submissions are left out of the snub ranking.
    pub snub_min_submissions: usize,
    /// Haters with this many hate points or fewer are discarded.
    pub hate_threshold: u64,
    pub top_haters: usize,
    pub top_songs_per_player: usize,
    pub top_artists: usize,
    pub top_songs: usize,
    pub top_leaderboard: usize,
    /// Upper bound on competitors x rounds for the hate point analysis.
    pub max_hate_cells: usize,
}

impl AnalysisRules {
    pub const DEFAULT_RULES: AnalysisRules = AnalysisRules {
        snub_min_submissions: 2,
        hate_threshold: 1,
        top_haters: 5,
        top_songs_per_player: 5,
        top_artists: 10,
        top_songs: 10,
        top_leaderboard: 10,
        max_hate_cells: 1_000_000,
    };
}

impl Default for AnalysisRules {
    fn default() -> Self {
        AnalysisRules::DEFAULT_RULES
    }
}
