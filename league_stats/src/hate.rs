//! Voting power that competitors kept away from a player.
//!
//! Two granularities are computed:
//! - [SeasonAnalysis::hate_points] works round by round. A round only counts
//!   when the player had something to vote for and the other competitor voted.
//! - [SeasonAnalysis::vote_allocation] compares the whole season budget of each
//!   voter with what reached the player.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

use crate::*;

// The player's tracks per round, and what every voter gave to them per round.
struct PlayerRounds<'a> {
    tracks: HashMap<RoundId, HashSet<&'a str>>,
    given: HashMap<(CompetitorId, RoundId), Points>,
}

impl<'a> PlayerRounds<'a> {
    fn build(season: &'a Season, player: &Competitor) -> PlayerRounds<'a> {
        let mut tracks: HashMap<RoundId, HashSet<&'a str>> = HashMap::new();
        for s in season
            .submissions()
            .iter()
            .filter(|s| s.submitter_id == player.id)
        {
            tracks
                .entry(s.round_id)
                .or_default()
                .insert(s.spotify_uri.as_str());
        }

        let mut given: HashMap<(CompetitorId, RoundId), Points> = HashMap::new();
        for v in season.votes().iter() {
            let to_player = tracks
                .get(&v.round_id)
                .map(|uris| uris.contains(v.spotify_uri.as_str()))
                .unwrap_or(false);
            if to_player {
                *given.entry((v.voter_id, v.round_id)).or_default() += v.points_assigned;
            }
        }
        PlayerRounds { tracks, given }
    }

    fn submitted_in(&self, round_id: RoundId) -> bool {
        self.tracks
            .get(&round_id)
            .map(|uris| !uris.is_empty())
            .unwrap_or(false)
    }

    fn given_by(&self, voter_id: CompetitorId, round_id: RoundId) -> Points {
        self.given
            .get(&(voter_id, round_id))
            .copied()
            .unwrap_or(Points::EMPTY)
    }
}

/// The part of the voting power that did not go to the player.
///
/// Giving more than what was spent means the data is inconsistent: the
/// round is floored at zero.
fn withheld(voting_power: Points, given: Points, context: &str) -> Points {
    match voting_power.checked_sub(given) {
        Some(hate) => hate,
        None => {
            warn!(
                "{}: {:?} points given to the player but only {:?} spent, counting zero",
                context, given, voting_power
            );
            Points::EMPTY
        }
    }
}

fn round_hate(
    lookups: &Lookups,
    player_rounds: &PlayerRounds,
    hater: &Competitor,
    round: &Round,
) -> HateRoundStats {
    let mut stats = HateRoundStats {
        round_id: round.id,
        round_name: round.name.clone(),
        voting_power: Points::EMPTY,
        points_to_player: Points::EMPTY,
        hate_points: Points::EMPTY,
        participated: false,
    };
    let voting_power = match lookups.round_power(hater.id, round.id) {
        Some(p) => p,
        // Did not vote this round.
        None => return stats,
    };
    stats.participated = true;
    stats.voting_power = voting_power;

    // Nothing to vote for, nothing to withhold.
    if !player_rounds.submitted_in(round.id) {
        return stats;
    }
    let given = player_rounds.given_by(hater.id, round.id);
    stats.points_to_player = given;
    stats.hate_points = withheld(voting_power, given, "round_hate");
    stats
}

impl<'a> SeasonAnalysis<'a> {
    /// Round-scoped hate points against the player, strongest haters first.
    ///
    /// Competitors at or under the hate threshold are left out. When nobody
    /// remains, the outcome is [HateReport::NoMeaningfulHaters].
    pub fn hate_points(&self, player_name: &str) -> Result<HateReport, StatsErrors> {
        let player = self.select_player(player_name)?;
        let season = self.season;

        let candidates: Vec<&Competitor> = season
            .competitors()
            .iter()
            .filter(|c| c.id != player.id)
            .collect();
        let cells = candidates.len() * season.rounds().len();
        if cells > self.rules.max_hate_cells {
            return Err(StatsErrors::AnalysisTooLarge {
                cells,
                limit: self.rules.max_hate_cells,
            });
        }

        let mut rounds: Vec<&Round> = season.rounds().iter().collect();
        rounds.sort_by_key(|r| r.created_at);
        let player_rounds = PlayerRounds::build(season, player);

        let mut haters: Vec<HaterRow> = Vec::new();
        for hater in candidates {
            let round_stats: Vec<HateRoundStats> = rounds
                .iter()
                .map(|r| round_hate(&self.lookups, &player_rounds, hater, r))
                .collect();
            let hate_points: Points = round_stats.iter().map(|rs| rs.hate_points).sum();
            let voting_power: Points = round_stats
                .iter()
                .filter(|rs| rs.participated)
                .map(|rs| rs.voting_power)
                .sum();
            debug!(
                "hate_points: {} -> {}: {:?} out of {:?}",
                hater.name, player.name, hate_points, voting_power
            );
            if hate_points.0 <= self.rules.hate_threshold {
                continue;
            }
            haters.push(HaterRow {
                hater_id: hater.id,
                username: hater.name.clone(),
                hate_points,
                voting_power,
                hate_percent: percent(hate_points.0, voting_power.0),
                rounds: round_stats,
            });
        }

        haters.sort_by(|a, b| b.hate_points.cmp(&a.hate_points));
        haters.truncate(self.rules.top_haters);
        info!(
            "hate_points: {} haters above {} points for {}",
            haters.len(),
            self.rules.hate_threshold,
            player.name
        );
        if haters.is_empty() {
            Ok(HateReport::NoMeaningfulHaters)
        } else {
            Ok(HateReport::Haters(haters))
        }
    }

    /// Season-scoped share of every voter's points that went to the player.
    ///
    /// Voters who spent nothing are left out. Rows are sorted by decreasing
    /// hate points.
    pub fn vote_allocation(&self, player_name: &str) -> Result<Vec<AllocationRow>, StatsErrors> {
        let player = self.select_player(player_name)?;

        let mut to_player: HashMap<CompetitorId, Points> = HashMap::new();
        for v in self.season.votes().iter() {
            if self.lookups.submitter_of(&v.spotify_uri, v.round_id) == Some(player.id) {
                *to_player.entry(v.voter_id).or_default() += v.points_assigned;
            }
        }

        let mut rows: Vec<AllocationRow> = self
            .season
            .competitors()
            .iter()
            .filter(|c| c.id != player.id)
            .filter_map(|c| {
                let budget = self.lookups.voter_budget(c.id);
                if budget == Points::EMPTY {
                    return None;
                }
                let given = to_player.get(&c.id).copied().unwrap_or(Points::EMPTY);
                Some(AllocationRow {
                    voter_id: c.id,
                    voter: c.name.clone(),
                    total_points_used: budget,
                    points_to_player: given,
                    hate_points: withheld(budget, given, "vote_allocation"),
                    share_percent: percent(given.0, budget.0),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.hate_points.cmp(&a.hate_points));
        debug!("vote_allocation: {} -> {:?}", player.name, rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn haters(report: HateReport) -> Vec<HaterRow> {
        match report {
            HateReport::Haters(rows) => rows,
            HateReport::NoMeaningfulHaters => panic!("expected haters"),
        }
    }

    #[test]
    fn single_vote_has_no_hate() {
        let season = single_vote_season_data();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        let ann = &season.competitors()[0];
        let ben = &season.competitors()[1];
        let player_rounds = PlayerRounds::build(&season, ann);
        let stats = round_hate(
            analysis.lookups(),
            &player_rounds,
            ben,
            &season.rounds()[0],
        );
        assert_eq!(stats.voting_power, Points(5));
        assert_eq!(stats.points_to_player, Points(5));
        assert_eq!(stats.hate_points, Points::EMPTY);
        assert!(stats.participated);
        assert_eq!(
            analysis.hate_points("Ann").unwrap(),
            HateReport::NoMeaningfulHaters
        );
    }

    #[test]
    fn hate_points_against_ann() {
        let season = small_season();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        let rows = haters(analysis.hate_points("Ann").unwrap());
        let summary: Vec<(&str, u64, u64, f64)> = rows
            .iter()
            .map(|r| {
                (
                    r.username.as_str(),
                    r.hate_points.0,
                    r.voting_power.0,
                    r.hate_percent,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Ben", 11, 15, 73.3),
                ("Cat", 8, 11, 72.7),
                ("Dan", 5, 10, 50.0)
            ]
        );

        // Rounds come in chronological order. Dan skipped the last one.
        let dan: Vec<(&str, u64, u64, bool)> = rows[2]
            .rounds
            .iter()
            .map(|rs| {
                (
                    rs.round_name.as_str(),
                    rs.voting_power.0,
                    rs.hate_points.0,
                    rs.participated,
                )
            })
            .collect();
        assert_eq!(
            dan,
            vec![
                ("Covers", 5, 0, true),
                ("Nineties", 5, 5, true),
                ("Guilty Pleasures", 0, 0, false)
            ]
        );
    }

    #[test]
    fn rounds_without_player_submission_do_not_count() {
        let season = small_season();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        let rows = haters(analysis.hate_points("Ben").unwrap());
        let summary: Vec<(&str, u64, u64, f64)> = rows
            .iter()
            .map(|r| {
                (
                    r.username.as_str(),
                    r.hate_points.0,
                    r.voting_power.0,
                    r.hate_percent,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Dan", 7, 10, 70.0),
                ("Ann", 2, 15, 13.3),
                ("Cat", 2, 11, 18.2)
            ]
        );
        let ann_last = rows[1].rounds.last().unwrap();
        assert_eq!(ann_last.round_name, "Guilty Pleasures");
        assert!(ann_last.participated);
        assert_eq!(ann_last.voting_power, Points(5));
        assert_eq!(ann_last.hate_points, Points::EMPTY);
    }

    #[test]
    fn player_without_submissions_has_no_haters() {
        let season = small_season();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        assert_eq!(
            analysis.hate_points("Dan").unwrap(),
            HateReport::NoMeaningfulHaters
        );
    }

    #[test]
    fn threshold_and_top_haters() {
        let season = small_season();
        let rules = AnalysisRules {
            hate_threshold: 5,
            ..AnalysisRules::DEFAULT_RULES
        };
        let analysis = SeasonAnalysis::new(&season, &rules);
        let names: Vec<String> = haters(analysis.hate_points("Ann").unwrap())
            .into_iter()
            .map(|r| r.username)
            .collect();
        assert_eq!(names, vec!["Ben", "Cat"]);

        let rules = AnalysisRules {
            top_haters: 1,
            ..AnalysisRules::DEFAULT_RULES
        };
        let analysis = SeasonAnalysis::new(&season, &rules);
        assert_eq!(haters(analysis.hate_points("Ann").unwrap()).len(), 1);
    }

    #[test]
    fn hate_never_exceeds_the_season_budget() {
        let season = small_season();
        let rules = AnalysisRules {
            hate_threshold: 0,
            ..AnalysisRules::DEFAULT_RULES
        };
        let analysis = SeasonAnalysis::new(&season, &rules);
        for player in season.competitors() {
            if let HateReport::Haters(rows) = analysis.hate_points(&player.name).unwrap() {
                for row in rows {
                    assert!(row.hate_points <= analysis.lookups().voter_budget(row.hater_id));
                    assert!(row.hate_percent >= 0.0 && row.hate_percent <= 100.0);
                }
            }
        }
    }

    #[test]
    fn inconsistent_round_is_floored() {
        init_logs();
        assert_eq!(withheld(Points(3), Points(5), "test"), Points::EMPTY);
        assert_eq!(withheld(Points(5), Points(3), "test"), Points(2));
    }

    #[test]
    fn large_analysis_is_refused() {
        let season = small_season();
        let rules = AnalysisRules {
            max_hate_cells: 8,
            ..AnalysisRules::DEFAULT_RULES
        };
        let analysis = SeasonAnalysis::new(&season, &rules);
        assert_eq!(
            analysis.hate_points("Ann"),
            Err(StatsErrors::AnalysisTooLarge {
                cells: 9,
                limit: 8
            })
        );
    }

    #[test]
    fn unknown_player_is_reported() {
        let season = small_season();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        assert_eq!(
            analysis.hate_points("Zed"),
            Err(StatsErrors::UnknownPlayer("Zed".to_string()))
        );
        assert!(analysis.vote_allocation("Zed").is_err());
    }

    #[test]
    fn vote_allocation_for_ben() {
        let season = small_season();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        let allocation = analysis.vote_allocation("Ben").unwrap();
        let rows: Vec<(&str, u64, u64, u64, f64)> = allocation
            .iter()
            .map(|r| {
                (
                    r.voter.as_str(),
                    r.total_points_used.0,
                    r.points_to_player.0,
                    r.hate_points.0,
                    r.share_percent,
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Ann", 15, 8, 7, 53.3),
                ("Dan", 10, 3, 7, 30.0),
                ("Cat", 11, 8, 3, 72.7)
            ]
        );
    }

    #[test]
    fn vote_allocation_identity() {
        let season = small_season();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        for player in season.competitors() {
            for row in analysis.vote_allocation(&player.name).unwrap() {
                assert_eq!(row.points_to_player + row.hate_points, row.total_points_used);
            }
        }
        let rows = analysis.vote_allocation("Ann").unwrap();
        assert_eq!(rows[0].voter, "Ben");
        assert_eq!(rows[0].total_points_used, Points(15));
        assert_eq!(rows[0].points_to_player, Points(4));
        assert_eq!(rows[0].hate_points, Points(11));
        assert_eq!(rows[0].share_percent, 26.7);
    }

    #[test]
    fn silent_voters_are_excluded_from_allocation() {
        let mut builder = small_season_builder();
        builder.add_competitor(5, "Eve").unwrap();
        let season = builder.build();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        let rows = analysis.vote_allocation("Ann").unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.voter != "Eve"));
    }
}
