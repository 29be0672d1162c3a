// Record types of the season export, shared by all the readers.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use league_stats::builder::SeasonBuilder;

use crate::season::*;

/// One of the four tables of a season export.
pub trait SeasonTable: DeserializeOwned + std::fmt::Debug {
    /// The file stem or the worksheet name.
    const NAME: &'static str;
    /// The columns that must be present in the header. Others are ignored.
    const COLUMNS: &'static [&'static str];
}

#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct CompetitorRecord {
    #[serde(rename = "ID")]
    pub id: CompetitorId,
    #[serde(rename = "Name")]
    pub name: String,
}

impl SeasonTable for CompetitorRecord {
    const NAME: &'static str = "competitors";
    const COLUMNS: &'static [&'static str] = &["ID", "Name"];
}

#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct RoundRecord {
    #[serde(rename = "ID")]
    pub id: RoundId,
    #[serde(rename = "Created")]
    pub created: String,
    #[serde(rename = "Name")]
    pub name: String,
}

impl SeasonTable for RoundRecord {
    const NAME: &'static str = "rounds";
    const COLUMNS: &'static [&'static str] = &["ID", "Created", "Name"];
}

#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct SubmissionRecord {
    #[serde(rename = "Spotify URI")]
    pub spotify_uri: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Artist(s)")]
    pub artists: String,
    #[serde(rename = "Submitter ID")]
    pub submitter_id: CompetitorId,
    #[serde(rename = "Round ID")]
    pub round_id: RoundId,
}

impl SeasonTable for SubmissionRecord {
    const NAME: &'static str = "submissions";
    const COLUMNS: &'static [&'static str] =
        &["Spotify URI", "Title", "Artist(s)", "Submitter ID", "Round ID"];
}

#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
pub struct VoteRecord {
    #[serde(rename = "Spotify URI")]
    pub spotify_uri: String,
    #[serde(rename = "Voter ID")]
    pub voter_id: CompetitorId,
    #[serde(rename = "Points Assigned")]
    pub points_assigned: u64,
    #[serde(rename = "Round ID")]
    pub round_id: RoundId,
}

impl SeasonTable for VoteRecord {
    const NAME: &'static str = "votes";
    const COLUMNS: &'static [&'static str] = &["Spotify URI", "Voter ID", "Points Assigned", "Round ID"];
}

/// A place the tables of a season can be read from.
pub trait TableSource {
    fn read_table<T: SeasonTable>(&mut self) -> StatsResult<Vec<T>>;
}

pub fn check_columns<T: SeasonTable>(header: &StringRecord) -> StatsResult<()> {
    for column in T::COLUMNS {
        if !header.iter().any(|h| h == *column) {
            return MissingColumnSnafu {
                table: T::NAME,
                column: *column,
            }
            .fail();
        }
    }
    Ok(())
}

/// Reads the creation date of a round: RFC 3339, a plain date-time or a plain date.
pub fn parse_created(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_rounds(records: Vec<RoundRecord>) -> StatsResult<Vec<Round>> {
    let mut res: Vec<Round> = Vec::new();
    for (idx, r) in records.into_iter().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let created_at = parse_created(&r.created).context(InvalidDateSnafu {
            table: RoundRecord::NAME,
            lineno,
            content: r.created.clone(),
        })?;
        res.push(Round {
            id: r.id,
            name: r.name,
            created_at,
        });
    }
    Ok(res)
}

/// Reads the four tables in order and assembles the season.
///
/// The dates of the rounds are checked before the next tables are read.
pub fn read_season<S: TableSource>(source: &mut S) -> StatsResult<Season> {
    let competitors: Vec<CompetitorRecord> = source.read_table()?;
    let rounds = parse_rounds(source.read_table()?)?;
    let submissions: Vec<SubmissionRecord> = source.read_table()?;
    let votes: Vec<VoteRecord> = source.read_table()?;
    info!(
        "read_season: {} competitors, {} rounds, {} submissions, {} votes",
        competitors.len(),
        rounds.len(),
        submissions.len(),
        votes.len()
    );

    let mut builder = SeasonBuilder::new();
    for c in competitors {
        builder.add_competitor(c.id, &c.name).context(SeasonSnafu {})?;
    }
    for r in rounds {
        builder
            .add_round(r.id, &r.name, r.created_at)
            .context(SeasonSnafu {})?;
    }
    for s in submissions {
        builder.add_submission(Submission {
            spotify_uri: s.spotify_uri,
            round_id: s.round_id,
            submitter_id: s.submitter_id,
            title: s.title,
            artists: s.artists,
        });
    }
    for v in votes {
        builder.add_vote(Vote {
            spotify_uri: v.spotify_uri,
            round_id: v.round_id,
            voter_id: v.voter_id,
            points_assigned: Points(v.points_assigned),
        });
    }
    Ok(builder.build())
}
