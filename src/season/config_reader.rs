use crate::season::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SeasonConfig {
    #[serde(rename = "seasonName")]
    pub season_name: String,
    /// Relative to the directory of the configuration file.
    #[serde(rename = "dataDirectory")]
    pub data_directory: Option<String>,
    pub provider: Option<String>,
    /// Relative to the data directory.
    #[serde(rename = "workbookPath")]
    pub workbook_path: Option<String>,
    pub rules: Option<RulesConfig>,
}

/// The analysis rules as written in the configuration file. Missing values
/// take the defaults of the library.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "snubMinSubmissions")]
    pub snub_min_submissions: Option<usize>,
    #[serde(rename = "hateThreshold")]
    pub hate_threshold: Option<u64>,
    #[serde(rename = "topHaters")]
    pub top_haters: Option<usize>,
    #[serde(rename = "topSongsPerPlayer")]
    pub top_songs_per_player: Option<usize>,
    #[serde(rename = "topArtists")]
    pub top_artists: Option<usize>,
    #[serde(rename = "topSongs")]
    pub top_songs: Option<usize>,
    #[serde(rename = "topLeaderboard")]
    pub top_leaderboard: Option<usize>,
    #[serde(rename = "maxHateCells")]
    pub max_hate_cells: Option<usize>,
}

impl RulesConfig {
    pub fn to_rules(&self) -> StatsResult<AnalysisRules> {
        let d = AnalysisRules::DEFAULT_RULES;
        let rules = AnalysisRules {
            snub_min_submissions: self
                .snub_min_submissions
                .unwrap_or(d.snub_min_submissions),
            hate_threshold: self.hate_threshold.unwrap_or(d.hate_threshold),
            top_haters: self.top_haters.unwrap_or(d.top_haters),
            top_songs_per_player: self
                .top_songs_per_player
                .unwrap_or(d.top_songs_per_player),
            top_artists: self.top_artists.unwrap_or(d.top_artists),
            top_songs: self.top_songs.unwrap_or(d.top_songs),
            top_leaderboard: self.top_leaderboard.unwrap_or(d.top_leaderboard),
            max_hate_cells: self.max_hate_cells.unwrap_or(d.max_hate_cells),
        };
        let sizes = [
            ("topHaters", rules.top_haters),
            ("topSongsPerPlayer", rules.top_songs_per_player),
            ("topArtists", rules.top_artists),
            ("topSongs", rules.top_songs),
            ("topLeaderboard", rules.top_leaderboard),
            ("maxHateCells", rules.max_hate_cells),
        ];
        for (name, value) in sizes {
            if value == 0 {
                whatever!("rules: {} must be at least 1", name)
            }
        }
        Ok(rules)
    }

    pub fn from_rules(rules: &AnalysisRules) -> RulesConfig {
        RulesConfig {
            snub_min_submissions: Some(rules.snub_min_submissions),
            hate_threshold: Some(rules.hate_threshold),
            top_haters: Some(rules.top_haters),
            top_songs_per_player: Some(rules.top_songs_per_player),
            top_artists: Some(rules.top_artists),
            top_songs: Some(rules.top_songs),
            top_leaderboard: Some(rules.top_leaderboard),
            max_hate_cells: Some(rules.max_hate_cells),
        }
    }
}

pub fn read_config(path: &str) -> StatsResult<SeasonConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SeasonConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> StatsResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_summary: {} top-level keys", js.as_object().map_or(0, |o| o.len()));
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_rules_take_defaults() {
        let config: SeasonConfig = serde_json::from_str(
            r#"{"seasonName": "S1", "provider": "csv", "rules": {"hateThreshold": 3, "topHaters": 2}}"#,
        )
        .unwrap();
        assert_eq!(config.data_directory, None);
        let rules = config.rules.unwrap().to_rules().unwrap();
        assert_eq!(
            rules,
            AnalysisRules {
                hate_threshold: 3,
                top_haters: 2,
                ..AnalysisRules::DEFAULT_RULES
            }
        );
    }

    #[test]
    fn empty_tables_are_rejected() {
        let rules = RulesConfig {
            top_leaderboard: Some(0),
            ..RulesConfig::default()
        };
        assert!(rules.to_rules().is_err());
    }

    #[test]
    fn rules_are_written_back() {
        let rules = AnalysisRules::DEFAULT_RULES;
        let js = serde_json::to_value(RulesConfig::from_rules(&rules)).unwrap();
        assert_eq!(js["maxHateCells"], json!(1_000_000));
        assert_eq!(js["snubMinSubmissions"], json!(2));
        assert_eq!(RulesConfig::from_rules(&rules).to_rules().unwrap(), rules);
    }
}
