use log::{debug, info, warn};

use league_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::season::config_reader::*;
use crate::season::io_common::read_season;

mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum StatsCliError {
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of table {table}"))]
    CsvLineParse {
        source: csv::Error,
        table: String,
        lineno: usize,
    },
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Missing worksheet {name} in workbook {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Missing column {column:?} in table {table}"))]
    MissingColumn { table: String, column: String },
    #[snafu(display(
        "Unexpected cell in table {table}, line {lineno}, column {column}: {content}"
    ))]
    WrongCellType {
        table: String,
        lineno: usize,
        column: usize,
        content: String,
    },
    #[snafu(display("Cannot read the date in table {table}, line {lineno}: {content:?}"))]
    InvalidDate {
        table: String,
        lineno: usize,
        content: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Analysis failed: {source}"))]
    Season { source: StatsErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type StatsResult<T> = Result<T, StatsCliError>;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NO_HATERS: &str = "no meaningful haters";

/// The config file and the command line, merged.
#[derive(Debug, Clone)]
struct SeasonSetup {
    season_name: String,
    provider: String,
    data_path: PathBuf,
    rules: RulesConfig,
}

fn resolve_setup(args: &Args) -> StatsResult<SeasonSetup> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (Some(config), root)
        }
        None => (None, PathBuf::from(".")),
    };

    let provider = args
        .input_type
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.provider.clone()))
        .unwrap_or_else(|| "csv".to_string());

    let data_path = match (&args.season, &config) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(c)) => {
            let dir = root.join(c.data_directory.as_deref().unwrap_or("."));
            match (provider.as_str(), &c.workbook_path) {
                ("xlsx", Some(workbook)) => dir.join(workbook),
                ("xlsx", None) => whatever!("The xlsx provider requires a workbookPath"),
                _ => dir,
            }
        }
        (None, None) => whatever!("Either --config or --season must be provided"),
    };

    let season_name = match &config {
        Some(c) => c.season_name.clone(),
        None => data_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("season")
            .to_string(),
    };

    let rules = config.and_then(|c| c.rules).unwrap_or_default();
    Ok(SeasonSetup {
        season_name,
        provider,
        data_path,
        rules,
    })
}

fn load_season(setup: &SeasonSetup) -> StatsResult<Season> {
    let p = setup.data_path.display().to_string();
    info!("Attempting to read season {:?} ({})", p, setup.provider);
    match setup.provider.as_str() {
        "csv" => read_season(&mut io_csv::CsvDirectory::new(&setup.data_path)),
        "xlsx" => read_season(&mut io_xlsx::XlsxWorkbook::open(&setup.data_path)?),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

// "All" is what the filter widgets offer for no filtering.
fn filter_value(value: &Option<String>) -> Option<String> {
    match value.as_deref() {
        None | Some("All") => None,
        Some(x) => Some(x.to_string()),
    }
}

fn explorer_filter(args: &Args) -> ExplorerFilter {
    ExplorerFilter {
        username: filter_value(&args.username),
        round: filter_value(&args.round),
    }
}

fn participation_to_json(rows: &[ParticipationRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|r| {
            json!({
                "Round": r.round,
                "Created": r.created_at.format(DATE_FORMAT).to_string(),
                "Unique Submitters": r.unique_submitters,
            })
        })
        .collect()
}

fn leaderboard_to_json(rows: &[LeaderboardRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|r| json!({"Username": r.username, "Total Points": r.total_points.0}))
        .collect()
}

fn snubs_to_json(report: &SnubReport) -> JSValue {
    let ranked: Vec<JSValue> = report
        .ranked
        .iter()
        .map(|r| {
            json!({
                "Rank": r.rank,
                "Username": r.stats.username,
                "Zero Vote Songs": r.stats.zero_vote_songs,
                "Total Submissions": r.stats.total_submissions,
                "Snub Rate (%)": r.stats.snub_rate,
            })
        })
        .collect();
    let unranked: Vec<JSValue> = report
        .unranked
        .iter()
        .map(|s| {
            json!({
                "Username": s.username,
                "Zero Vote Songs": s.zero_vote_songs,
                "Total Submissions": s.total_submissions,
            })
        })
        .collect();
    json!({"ranked": ranked, "unranked": unranked})
}

fn explorer_to_json(rows: &[ExplorerRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|r| {
            json!({
                "Round Name": r.round_name,
                "Username": r.username,
                "Song Name": r.song_name,
                "Artist Name": r.artist_name,
                "Number of Votes": r.number_of_votes.0,
            })
        })
        .collect()
}

fn with_all(values: &[String]) -> Vec<String> {
    let mut res = vec!["All".to_string()];
    res.extend(values.iter().cloned());
    res
}

fn songs_to_json(rows: &[SongRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|s| {
            json!({
                "Round Name": s.round_name,
                "Song Name": s.song_name,
                "Artist Name": s.artist_name,
                "Total Points": s.total_points.0,
            })
        })
        .collect()
}

fn profile_to_json(profile: &PlayerProfile) -> JSValue {
    let supporters: Vec<JSValue> = profile
        .supporters
        .iter()
        .map(|s| json!({"Voter": s.voter, "Points Given": s.points_given.0}))
        .collect();
    json!({
        "username": profile.username,
        "submissions": profile.submissions,
        "total_points": profile.total_points.0,
        "average_points": profile.average_points,
        "top_songs": songs_to_json(&profile.top_songs),
        "bottom_songs": songs_to_json(&profile.bottom_songs),
        "supporters": supporters,
    })
}

fn hate_to_json(report: &HateReport) -> JSValue {
    match report {
        HateReport::NoMeaningfulHaters => json!(NO_HATERS),
        HateReport::Haters(rows) => {
            let l: Vec<JSValue> = rows
                .iter()
                .map(|h| {
                    let rounds: Vec<JSValue> = h
                        .rounds
                        .iter()
                        .map(|rs| {
                            json!({
                                "Round": rs.round_name,
                                "Voting Power": rs.voting_power.0,
                                "Points to You": rs.points_to_player.0,
                                "Hate Points": rs.hate_points.0,
                                "Participated": rs.participated,
                            })
                        })
                        .collect();
                    json!({
                        "Username": h.username,
                        "Hate Points": h.hate_points.0,
                        "Voting Power": h.voting_power.0,
                        "Hate %": h.hate_percent,
                        "rounds": rounds,
                    })
                })
                .collect();
            JSValue::Array(l)
        }
    }
}

fn allocation_to_json(rows: &[AllocationRow]) -> Vec<JSValue> {
    rows.iter()
        .map(|a| {
            json!({
                "Voter": a.voter,
                "Total Points Used": a.total_points_used.0,
                "Points to You": a.points_to_player.0,
                "Hate Points": a.hate_points.0,
                "Your Share %": a.share_percent,
            })
        })
        .collect()
}

fn matrix_to_json(matrix: &VoteMatrix) -> JSValue {
    let cells: Vec<Vec<u64>> = matrix
        .cells
        .iter()
        .map(|row| row.iter().map(|p| p.0).collect())
        .collect();
    json!({
        "voters": matrix.voters,
        "submitters": matrix.submitters,
        "cells": cells,
    })
}

fn metrics_to_json(m: &MetricsSummary) -> JSValue {
    let top_artists: Vec<JSValue> = m
        .top_artists
        .iter()
        .map(|a| json!({"Artist": a.artist, "Submission Count": a.submission_count}))
        .collect();
    let repeated_songs: Vec<JSValue> = m
        .repeated_songs
        .iter()
        .map(|s| json!({"Song": s.song, "Artist": s.artist, "Submission Count": s.submission_count}))
        .collect();
    let top_titles: Vec<JSValue> = m
        .top_titles
        .iter()
        .map(|s| json!({"Song": s.song, "Submission Count": s.submission_count}))
        .collect();
    json!({
        "total_votes": m.total_votes,
        "total_submissions": m.total_submissions,
        "total_competitors": m.total_competitors,
        "average_points_per_song": m.average_points_per_song,
        "average_points_per_voter": m.average_points_per_voter,
        "top_artists": top_artists,
        "repeated_songs": repeated_songs,
        "top_titles": top_titles,
        "matrix": matrix_to_json(&m.matrix),
    })
}

fn build_summary_js(
    setup: &SeasonSetup,
    analysis: &SeasonAnalysis,
    filter: &ExplorerFilter,
    player: Option<&str>,
) -> StatsResult<JSValue> {
    let options = analysis.explorer_options();
    let c = json!({
        "season": setup.season_name,
        "rules": RulesConfig::from_rules(analysis.rules()),
    });
    let mut summary = json!({
        "config": c,
        "participation": participation_to_json(&analysis.participation()),
        "leaderboard": leaderboard_to_json(&analysis.leaderboard()),
        "leaderboard_top": leaderboard_to_json(&analysis.leaderboard_top()),
        "snubs": snubs_to_json(&analysis.snubs()),
        "explorer": explorer_to_json(&analysis.explorer(filter)),
        "explorer_options": {
            "usernames": with_all(&options.usernames),
            "rounds": with_all(&options.rounds),
        },
        "metrics": metrics_to_json(&analysis.metrics()),
    });

    if let Some(name) = player {
        let profile = analysis.player_profile(name).context(SeasonSnafu {})?;
        let hate = analysis.hate_points(name).context(SeasonSnafu {})?;
        let allocation = analysis.vote_allocation(name).context(SeasonSnafu {})?;
        summary["player"] = profile_to_json(&profile);
        summary["hate"] = hate_to_json(&hate);
        summary["allocation"] = JSValue::Array(allocation_to_json(&allocation));
    }
    Ok(summary)
}

pub fn run_season(args: &Args) -> StatsResult<()> {
    let setup = resolve_setup(args)?;
    debug!("run_season: setup: {:?}", setup);
    let rules = setup.rules.to_rules()?;

    let season = load_season(&setup)?;
    let analysis = SeasonAnalysis::new(&season, &rules);

    // Assemble the final json
    let result_js = build_summary_js(
        &setup,
        &analysis,
        &explorer_filter(args),
        args.player.as_deref(),
    )?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(out_path) => {
            fs::write(out_path, &pretty_js_stats).context(WritingSummarySnafu { path: out_path })?;
            info!("Summary written to {:?}", out_path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snafu::ErrorCompat;

    fn test_dir() -> String {
        format!("{}/tests/data", env!("CARGO_MANIFEST_DIR"))
    }

    fn run_season_test(test_name: &str, player: Option<&str>) -> StatsResult<()> {
        let test_dir = test_dir();
        info!("Running test {}", test_name);
        let args = Args {
            config: Some(format!(
                "{}/{}/{}_config.json",
                test_dir, test_name, test_name
            )),
            reference: Some(format!(
                "{}/{}/{}_expected_summary.json",
                test_dir, test_name, test_name
            )),
            player: player.map(str::to_string),
            ..Args::default()
        };
        run_season(&args)
    }

    fn test_wrapper(test_name: &str, player: Option<&str>) {
        let res = run_season_test(test_name, player);
        if let Err(e) = &res {
            eprintln!("An error occured {}", e);
            if let Some(bt) = ErrorCompat::backtrace(e) {
                eprintln!("trace: {}", bt);
            }
        }
        assert!(res.is_ok());
    }

    fn season_args(dir_name: &str) -> Args {
        Args {
            season: Some(format!("{}/{}", test_dir(), dir_name)),
            ..Args::default()
        }
    }

    #[test]
    fn two_rounds() {
        test_wrapper("two_rounds", Some("Ann"));
    }

    #[test]
    fn two_rounds_xlsx() {
        test_wrapper("two_rounds_xlsx", Some("Ann"));
    }

    #[test]
    fn reference_mismatch_fails() {
        // The reference was computed with a selected player.
        let res = run_season_test("two_rounds", None);
        assert!(matches!(res, Err(StatsCliError::Whatever { .. })));
    }

    #[test]
    fn unknown_player_fails() {
        let res = run_season_test("two_rounds", Some("Zed"));
        assert!(matches!(
            res,
            Err(StatsCliError::Season {
                source: StatsErrors::UnknownPlayer(_)
            })
        ));
    }

    #[test]
    fn summary_without_player() {
        let args = season_args("two_rounds");
        let setup = resolve_setup(&args).unwrap();
        assert_eq!(setup.season_name, "two_rounds");
        assert_eq!(setup.provider, "csv");
        let season = load_season(&setup).unwrap();
        let rules = setup.rules.to_rules().unwrap();
        let analysis = SeasonAnalysis::new(&season, &rules);
        let js = build_summary_js(&setup, &analysis, &ExplorerFilter::ALL, None).unwrap();
        assert!(js.get("player").is_none());
        assert!(js.get("hate").is_none());
        assert_eq!(js["leaderboard"].as_array().unwrap().len(), 3);
        assert_eq!(js["leaderboard_top"].as_array().unwrap().len(), 3);
        assert_eq!(js["explorer_options"]["rounds"][0], json!("All"));
    }

    #[test]
    fn explorer_filters_from_args() {
        let mut args = season_args("two_rounds");
        args.username = Some("Cat".to_string());
        args.round = Some("All".to_string());
        let filter = explorer_filter(&args);
        assert_eq!(filter.username, Some("Cat".to_string()));
        assert_eq!(filter.round, None);

        let setup = resolve_setup(&args).unwrap();
        let season = load_season(&setup).unwrap();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);
        let js = build_summary_js(&setup, &analysis, &filter, None).unwrap();
        let songs: Vec<&str> = js["explorer"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["Song Name"].as_str().unwrap())
            .collect();
        assert_eq!(songs, vec!["Charlie", "Alpha"]);
    }

    #[test]
    fn matrix_keeps_voter_names() {
        let mut b = league_stats::builder::SeasonBuilder::new();
        b.add_competitor(1, "Voter").unwrap();
        b.add_competitor(2, "Ben").unwrap();
        let created = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        b.add_round(10, "R1", created).unwrap();
        b.add_submission_simple("u1", 10, 1, "Song A", "Artist X");
        b.add_vote_simple("u1", 10, 2, 5);
        let season = b.build();
        let analysis = SeasonAnalysis::new(&season, &AnalysisRules::DEFAULT_RULES);

        let js = matrix_to_json(&analysis.metrics().matrix);
        assert_eq!(
            js,
            json!({"voters": ["Ben"], "submitters": ["Voter"], "cells": [[5]]})
        );
    }

    #[test]
    fn missing_column_is_fatal() {
        let res = run_season(&season_args("missing_column"));
        match res {
            Err(StatsCliError::MissingColumn { table, column }) => {
                assert_eq!(table, "competitors");
                assert_eq!(column, "Name");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn bad_date_is_fatal() {
        let res = run_season(&season_args("bad_date"));
        match res {
            Err(StatsCliError::InvalidDate {
                table,
                lineno,
                content,
            }) => {
                assert_eq!(table, "rounds");
                assert_eq!(lineno, 3);
                assert_eq!(content, "last tuesday");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn missing_worksheet_is_fatal() {
        let mut args = season_args("missing_sheet/season.xlsx");
        args.input_type = Some("xlsx".to_string());
        match run_season(&args) {
            Err(StatsCliError::MissingWorksheet { name, .. }) => assert_eq!(name, "rounds"),
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn unreadable_workbook_is_fatal() {
        let mut args = season_args("two_rounds/competitors.csv");
        args.input_type = Some("xlsx".to_string());
        let res = run_season(&args);
        assert!(matches!(res, Err(StatsCliError::OpeningExcel { .. })));
    }

    #[test]
    fn xlsx_config_needs_a_workbook() {
        let args = Args {
            config: Some(format!(
                "{}/two_rounds/two_rounds_config.json",
                test_dir()
            )),
            input_type: Some("xlsx".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            resolve_setup(&args),
            Err(StatsCliError::Whatever { .. })
        ));

        let args = Args {
            config: Some(format!(
                "{}/two_rounds_xlsx/two_rounds_xlsx_config.json",
                test_dir()
            )),
            ..Args::default()
        };
        let setup = resolve_setup(&args).unwrap();
        assert_eq!(setup.provider, "xlsx");
        assert!(setup.data_path.ends_with("two_rounds.xlsx"));
    }

    #[test]
    fn missing_season_is_fatal() {
        let res = run_season(&season_args("does_not_exist"));
        assert!(matches!(res, Err(StatsCliError::CsvOpen { .. })));
        assert!(matches!(
            run_season(&Args::default()),
            Err(StatsCliError::Whatever { .. })
        ));
    }
}
