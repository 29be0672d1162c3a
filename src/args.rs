use clap::Parser;

/// This is a statistics program for song-voting leagues.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the season: its name, where the data lives
    /// and the analysis rules. See the manual for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory or workbook path) The season data. For csv inputs, a directory with the files
    /// competitors.csv, rounds.csv, submissions.csv and votes.csv. For xlsx inputs, the workbook.
    /// Setting this option overrides the location given in the --config file.
    #[clap(short, long, value_parser)]
    pub season: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (display name, optional) If specified, the profile, hate points and vote allocation of
    /// this competitor are added to the summary.
    #[clap(short, long, value_parser)]
    pub player: Option<String>,

    /// (display name or All) Only keep the submissions of this competitor in the explorer table.
    #[clap(long, value_parser)]
    pub username: Option<String>,

    /// (round name or All) Only keep the submissions of this round in the explorer table.
    #[clap(long, value_parser)]
    pub round: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the season will be written in
    /// JSON format to the given location. Otherwise it is printed.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the summary of a season in JSON format. If
    /// provided, mlstats will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
