/*!
Analytics engine for song-voting leagues.

A season is made of four relations: competitors, rounds, submissions and
votes. [SeasonAnalysis] computes every derived table from them: round
participation, the leaderboard, snubs, the submission explorer, player
profiles, hate points, vote allocation and season metrics.

```
use chrono::NaiveDate;
use league_stats::builder::SeasonBuilder;
use league_stats::*;

let created = NaiveDate::from_ymd_opt(2024, 1, 5)
    .unwrap()
    .and_hms_opt(20, 0, 0)
    .unwrap();
let mut builder = SeasonBuilder::new();
builder.add_competitor(1, "Ann")?;
builder.add_competitor(2, "Ben")?;
builder.add_round(10, "R1", created)?;
builder.add_submission_simple("u1", 10, 1, "Song A", "Artist X");
builder.add_vote_simple("u1", 10, 2, 5);
let season = builder.build();

let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
let leaderboard = analysis.leaderboard();
assert_eq!(leaderboard[0].username, "Ann");
assert_eq!(leaderboard[0].total_points, Points(5));
# Ok::<(), StatsErrors>(())
```

See the [manual] for the meaning of each table.
*/

mod config;
pub mod builder;
#[cfg(test)]
mod fixtures;
mod hate;
pub mod manual;

use indexmap::IndexMap;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap, HashSet};

pub use crate::config::*;

// **** Shared lookups ****

/// Id to name maps, and the joins that every table relies on.
///
/// Built once per season, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Lookups<'a> {
    competitor_names: HashMap<CompetitorId, &'a str>,
    round_names: HashMap<RoundId, &'a str>,
    // Points per track, summed over all rounds.
    uri_totals: IndexMap<&'a str, Points>,
    // Who submitted a track, per round.
    attribution: HashMap<&'a str, HashMap<RoundId, CompetitorId>>,
    // Points spent by each voter over the season.
    voter_budgets: IndexMap<CompetitorId, Points>,
    // Points spent by each voter in each round they voted in.
    round_power: HashMap<(CompetitorId, RoundId), Points>,
}

impl<'a> Lookups<'a> {
    pub fn build(season: &'a Season) -> Lookups<'a> {
        let competitor_names: HashMap<CompetitorId, &'a str> = season
            .competitors()
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();
        let round_names: HashMap<RoundId, &'a str> = season
            .rounds()
            .iter()
            .map(|r| (r.id, r.name.as_str()))
            .collect();

        let mut uri_totals: IndexMap<&'a str, Points> = IndexMap::new();
        let mut voter_budgets: IndexMap<CompetitorId, Points> = IndexMap::new();
        let mut round_power: HashMap<(CompetitorId, RoundId), Points> = HashMap::new();
        for v in season.votes().iter() {
            *uri_totals.entry(v.spotify_uri.as_str()).or_default() += v.points_assigned;
            *voter_budgets.entry(v.voter_id).or_default() += v.points_assigned;
            *round_power.entry((v.voter_id, v.round_id)).or_default() += v.points_assigned;
        }

        let mut attribution: HashMap<&'a str, HashMap<RoundId, CompetitorId>> = HashMap::new();
        for s in season.submissions().iter() {
            let per_round = attribution.entry(s.spotify_uri.as_str()).or_default();
            match per_round.get(&s.round_id).copied() {
                Some(previous) => {
                    warn!(
                        "Lookups::build: track {} submitted twice in round {} (by {} and {}), keeping the first",
                        s.spotify_uri, s.round_id, previous, s.submitter_id
                    );
                }
                None => {
                    per_round.insert(s.round_id, s.submitter_id);
                }
            }
        }

        debug!(
            "Lookups::build: {} tracks with votes, {} voters, {} submitted tracks",
            uri_totals.len(),
            voter_budgets.len(),
            attribution.len()
        );

        Lookups {
            competitor_names,
            round_names,
            uri_totals,
            attribution,
            voter_budgets,
            round_power,
        }
    }

    pub fn competitor_name(&self, id: CompetitorId) -> Option<&'a str> {
        self.competitor_names.get(&id).copied()
    }

    pub fn round_name(&self, id: RoundId) -> Option<&'a str> {
        self.round_names.get(&id).copied()
    }

    /// Points received by a track over all rounds, zero if nobody voted for it.
    pub fn uri_total(&self, spotify_uri: &str) -> Points {
        self.uri_totals
            .get(spotify_uri)
            .copied()
            .unwrap_or(Points::EMPTY)
    }

    /// The competitor who submitted this track in this round.
    pub fn submitter_of(&self, spotify_uri: &str, round_id: RoundId) -> Option<CompetitorId> {
        self.attribution
            .get(spotify_uri)
            .and_then(|per_round| per_round.get(&round_id))
            .copied()
    }

    /// All the points this competitor spent during the season.
    pub fn voter_budget(&self, voter_id: CompetitorId) -> Points {
        self.voter_budgets
            .get(&voter_id)
            .copied()
            .unwrap_or(Points::EMPTY)
    }

    /// The points spent by a voter in a round, or `None` if they cast no vote in it.
    pub fn round_power(&self, voter_id: CompetitorId, round_id: RoundId) -> Option<Points> {
        self.round_power.get(&(voter_id, round_id)).copied()
    }
}

/// Percentage rounded to one decimal. An empty denominator gives zero.
pub(crate) fn percent(num: u64, den: u64) -> f64 {
    if den == 0 {
        return 0.0;
    }
    let p = (num as f64) * 100.0 / (den as f64);
    (p * 10.0).round() / 10.0
}

fn mean(total: Points, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total.0 as f64 / count as f64
    }
}

// **** Analysis ****

/// All the derived tables of one season.
///
/// Every method is a pure function of the season and the rules.
#[derive(Debug, Clone)]
pub struct SeasonAnalysis<'a> {
    season: &'a Season,
    rules: AnalysisRules,
    lookups: Lookups<'a>,
}

impl<'a> SeasonAnalysis<'a> {
    pub fn new(season: &'a Season, rules: &AnalysisRules) -> SeasonAnalysis<'a> {
        info!(
            "Analysing season: {} competitors, {} rounds, {} submissions, {} votes",
            season.competitors().len(),
            season.rounds().len(),
            season.submissions().len(),
            season.votes().len()
        );
        debug!("SeasonAnalysis::new: rules: {:?}", rules);
        SeasonAnalysis {
            season,
            rules: rules.clone(),
            lookups: Lookups::build(season),
        }
    }

    pub fn season(&self) -> &'a Season {
        self.season
    }

    pub fn rules(&self) -> &AnalysisRules {
        &self.rules
    }

    pub fn lookups(&self) -> &Lookups<'a> {
        &self.lookups
    }

    /// Number of distinct submitters per round, oldest round first.
    pub fn participation(&self) -> Vec<ParticipationRow> {
        let mut submitters: HashMap<RoundId, HashSet<CompetitorId>> = HashMap::new();
        for s in self.season.submissions().iter() {
            if self.lookups.round_name(s.round_id).is_none() {
                warn!(
                    "participation: track {} references unknown round {}",
                    s.spotify_uri, s.round_id
                );
                continue;
            }
            submitters
                .entry(s.round_id)
                .or_default()
                .insert(s.submitter_id);
        }

        let mut rows: Vec<ParticipationRow> = self
            .season
            .rounds()
            .iter()
            .map(|r| ParticipationRow {
                round_id: r.id,
                round: r.name.clone(),
                created_at: r.created_at,
                unique_submitters: submitters.get(&r.id).map(|s| s.len()).unwrap_or(0),
            })
            .collect();
        rows.sort_by_key(|row| row.created_at);
        debug!("participation: {:?}", rows);
        rows
    }

    /// Total points received per competitor name, highest first.
    ///
    /// Votes are attributed through the (track, round) of the submission.
    /// Competitors who received nothing are not listed.
    pub fn leaderboard(&self) -> Vec<LeaderboardRow> {
        let mut totals: IndexMap<&str, Points> = IndexMap::new();
        for v in self.season.votes().iter() {
            let submitter = match self.lookups.submitter_of(&v.spotify_uri, v.round_id) {
                Some(cid) => cid,
                None => {
                    warn!(
                        "leaderboard: vote by {} on {} in round {} matches no submission",
                        v.voter_id, v.spotify_uri, v.round_id
                    );
                    continue;
                }
            };
            match self.lookups.competitor_name(submitter) {
                Some(name) => {
                    *totals.entry(name).or_default() += v.points_assigned;
                }
                None => {
                    warn!("leaderboard: unknown submitter {}", submitter);
                }
            }
        }

        let mut rows: Vec<LeaderboardRow> = totals
            .into_iter()
            .filter(|(_, points)| *points > Points::EMPTY)
            .map(|(name, total_points)| LeaderboardRow {
                username: name.to_string(),
                total_points,
            })
            .collect();
        rows.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        rows
    }

    /// The head of the leaderboard, as shown in charts.
    pub fn leaderboard_top(&self) -> Vec<LeaderboardRow> {
        let mut rows = self.leaderboard();
        rows.truncate(self.rules.top_leaderboard);
        rows
    }

    /// Songs that received no point at all, per submitter.
    pub fn snubs(&self) -> SnubReport {
        // name -> (zero vote songs, total submissions)
        let mut per_name: IndexMap<&str, (usize, usize)> = IndexMap::new();
        for s in self.season.submissions().iter() {
            let name = match self.lookups.competitor_name(s.submitter_id) {
                Some(name) => name,
                None => {
                    warn!(
                        "snubs: skipping track {} submitted by unknown competitor {}",
                        s.spotify_uri, s.submitter_id
                    );
                    continue;
                }
            };
            let e = per_name.entry(name).or_insert((0, 0));
            e.1 += 1;
            if self.lookups.uri_total(&s.spotify_uri) == Points::EMPTY {
                e.0 += 1;
            }
        }

        let stats: Vec<SnubStats> = per_name
            .into_iter()
            .map(|(name, (zero, total))| SnubStats {
                username: name.to_string(),
                zero_vote_songs: zero,
                total_submissions: total,
                snub_rate: percent(zero as u64, total as u64),
            })
            .collect();

        let mut eligible: Vec<SnubStats> = stats
            .iter()
            .filter(|s| s.total_submissions >= self.rules.snub_min_submissions)
            .cloned()
            .collect();
        eligible.sort_by(|a, b| b.snub_rate.total_cmp(&a.snub_rate));
        let ranked: Vec<RankedSnub> = eligible
            .into_iter()
            .enumerate()
            .map(|(idx, stats)| RankedSnub {
                rank: idx + 1,
                stats,
            })
            .collect();

        let mut unranked: Vec<SnubStats> =
            stats.into_iter().filter(|s| s.zero_vote_songs > 0).collect();
        unranked.sort_by(|a, b| b.zero_vote_songs.cmp(&a.zero_vote_songs));

        debug!("snubs: ranked: {:?} unranked: {:?}", ranked, unranked);
        SnubReport { ranked, unranked }
    }

    /// One row per submission, in input order, narrowed by the filter.
    pub fn explorer(&self, filter: &ExplorerFilter) -> Vec<ExplorerRow> {
        let rows: Vec<ExplorerRow> = self
            .season
            .submissions()
            .iter()
            .map(|s| ExplorerRow {
                round_name: self.lookups.round_name(s.round_id).map(str::to_string),
                username: self
                    .lookups
                    .competitor_name(s.submitter_id)
                    .map(str::to_string),
                song_name: s.title.clone(),
                artist_name: s.primary_artist().to_string(),
                number_of_votes: self.lookups.uri_total(&s.spotify_uri),
            })
            .filter(|row| filter.matches(row))
            .collect();
        debug!("explorer: filter {:?}: {} rows", filter, rows.len());
        rows
    }

    pub fn explorer_options(&self) -> ExplorerOptions {
        let rows = self.explorer(&ExplorerFilter::ALL);
        let usernames: BTreeSet<String> = rows.iter().filter_map(|r| r.username.clone()).collect();
        let rounds: BTreeSet<String> = rows.iter().filter_map(|r| r.round_name.clone()).collect();
        ExplorerOptions {
            usernames: usernames.into_iter().collect(),
            rounds: rounds.into_iter().collect(),
        }
    }

    /// Finds a competitor by display name.
    ///
    /// When several competitors share the name, the first one in input order is used.
    pub fn select_player(&self, name: &str) -> Result<&'a Competitor, StatsErrors> {
        let season: &'a Season = self.season;
        let matches: Vec<&'a Competitor> = season
            .competitors()
            .iter()
            .filter(|c| c.name == name)
            .collect();
        match matches.as_slice() {
            [] => Err(StatsErrors::UnknownPlayer(name.to_string())),
            [single] => Ok(*single),
            [first, ..] => {
                warn!(
                    "select_player: {} competitors are named {:?}, using id {}",
                    matches.len(),
                    name,
                    first.id
                );
                Ok(*first)
            }
        }
    }

    pub fn player_profile(&self, name: &str) -> Result<PlayerProfile, StatsErrors> {
        let player = self.select_player(name)?;
        let submissions: Vec<&Submission> = self
            .season
            .submissions()
            .iter()
            .filter(|s| s.submitter_id == player.id)
            .collect();

        let songs: Vec<SongRow> = submissions
            .iter()
            .map(|s| SongRow {
                round_name: self.lookups.round_name(s.round_id).map(str::to_string),
                song_name: s.title.clone(),
                artist_name: s.primary_artist().to_string(),
                total_points: self.lookups.uri_total(&s.spotify_uri),
            })
            .collect();
        let total_points: Points = songs.iter().map(|s| s.total_points).sum();

        let mut descending = songs.clone();
        descending.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        descending.truncate(self.rules.top_songs_per_player);
        let mut ascending = songs.clone();
        ascending.sort_by_key(|s| s.total_points);
        ascending.truncate(self.rules.top_songs_per_player);

        let player_uris: HashSet<&str> =
            submissions.iter().map(|s| s.spotify_uri.as_str()).collect();
        let mut given: IndexMap<Option<&str>, Points> = IndexMap::new();
        for v in self
            .season
            .votes()
            .iter()
            .filter(|v| player_uris.contains(v.spotify_uri.as_str()))
        {
            *given
                .entry(self.lookups.competitor_name(v.voter_id))
                .or_default() += v.points_assigned;
        }
        let mut supporters: Vec<SupporterRow> = given
            .into_iter()
            .map(|(voter, points_given)| SupporterRow {
                voter: voter.map(str::to_string),
                points_given,
            })
            .collect();
        supporters.sort_by(|a, b| b.points_given.cmp(&a.points_given));

        info!(
            "player_profile: {} ({}): {} songs, {:?} points",
            player.name,
            player.id,
            songs.len(),
            total_points
        );
        Ok(PlayerProfile {
            player_id: player.id,
            username: player.name.clone(),
            submissions: songs.len(),
            total_points,
            average_points: mean(total_points, songs.len()),
            top_songs: descending,
            bottom_songs: ascending,
            supporters,
        })
    }

    /// Season-wide scalars, frequency tables and the voter x submitter matrix.
    pub fn metrics(&self) -> MetricsSummary {
        let season = self.season;

        let song_points: Points = self.lookups.uri_totals.values().copied().sum();
        let voter_points: Points = self.lookups.voter_budgets.values().copied().sum();

        let mut artists: IndexMap<&str, usize> = IndexMap::new();
        let mut pairs: IndexMap<(&str, &str), usize> = IndexMap::new();
        let mut titles: IndexMap<&str, usize> = IndexMap::new();
        for s in season.submissions().iter() {
            *artists.entry(s.primary_artist()).or_default() += 1;
            *pairs
                .entry((s.title.as_str(), s.primary_artist()))
                .or_default() += 1;
            *titles.entry(s.title.as_str()).or_default() += 1;
        }

        let mut top_artists: Vec<ArtistCount> = artists
            .into_iter()
            .map(|(artist, submission_count)| ArtistCount {
                artist: artist.to_string(),
                submission_count,
            })
            .collect();
        top_artists.sort_by(|a, b| b.submission_count.cmp(&a.submission_count));
        top_artists.truncate(self.rules.top_artists);

        let mut repeated_songs: Vec<SongCount> = pairs
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((song, artist), submission_count)| SongCount {
                song: song.to_string(),
                artist: artist.to_string(),
                submission_count,
            })
            .collect();
        repeated_songs.sort_by(|a, b| b.submission_count.cmp(&a.submission_count));
        repeated_songs.truncate(self.rules.top_songs);

        let mut top_titles: Vec<SongCount> = titles
            .into_iter()
            .map(|(song, submission_count)| SongCount {
                song: song.to_string(),
                artist: String::new(),
                submission_count,
            })
            .collect();
        top_titles.sort_by(|a, b| b.submission_count.cmp(&a.submission_count));
        top_titles.truncate(self.rules.top_songs);

        MetricsSummary {
            total_votes: season.votes().len(),
            total_submissions: season.submissions().len(),
            total_competitors: season.competitors().len(),
            average_points_per_song: mean(song_points, self.lookups.uri_totals.len()),
            average_points_per_voter: mean(voter_points, self.lookups.voter_budgets.len()),
            top_artists,
            repeated_songs,
            top_titles,
            matrix: self.vote_matrix(),
        }
    }

    fn vote_matrix(&self) -> VoteMatrix {
        let mut cells: HashMap<(&str, &str), Points> = HashMap::new();
        let mut voters: BTreeSet<&str> = BTreeSet::new();
        let mut submitters: BTreeSet<&str> = BTreeSet::new();
        for v in self.season.votes().iter() {
            let voter = match self.lookups.competitor_name(v.voter_id) {
                Some(name) => name,
                None => {
                    warn!("vote_matrix: unknown voter {}", v.voter_id);
                    continue;
                }
            };
            let submitter = match self
                .lookups
                .submitter_of(&v.spotify_uri, v.round_id)
                .and_then(|cid| self.lookups.competitor_name(cid))
            {
                Some(name) => name,
                None => {
                    warn!(
                        "vote_matrix: no known submitter for {} in round {}",
                        v.spotify_uri, v.round_id
                    );
                    continue;
                }
            };
            voters.insert(voter);
            submitters.insert(submitter);
            *cells.entry((voter, submitter)).or_default() += v.points_assigned;
        }

        let cells: Vec<Vec<Points>> = voters
            .iter()
            .map(|voter| {
                submitters
                    .iter()
                    .map(|submitter| {
                        cells
                            .get(&(*voter, *submitter))
                            .copied()
                            .unwrap_or(Points::EMPTY)
                    })
                    .collect()
            })
            .collect();
        VoteMatrix {
            voters: voters.into_iter().map(str::to_string).collect(),
            submitters: submitters.into_iter().map(str::to_string).collect(),
            cells,
        }
    }
}
