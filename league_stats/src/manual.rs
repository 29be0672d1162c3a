/*!

This is the long-form manual for `league_stats` and `mlstats`.

## Input formats

A season is made of four tables, as exported by the league platform:

| Table         | Required columns                                                   |
|---------------|--------------------------------------------------------------------|
| `competitors` | `ID`, `Name`                                                       |
| `rounds`      | `ID`, `Created`, `Name`                                            |
| `submissions` | `Spotify URI`, `Title`, `Artist(s)`, `Submitter ID`, `Round ID`    |
| `votes`       | `Spotify URI`, `Voter ID`, `Points Assigned`, `Round ID`           |

Other columns are ignored. The following providers are supported:
* `csv` (default): a directory with the files `competitors.csv`, `rounds.csv`,
  `submissions.csv` and `votes.csv`.
* `xlsx`: one Excel workbook with the worksheets `competitors`, `rounds`,
  `submissions` and `votes`.

The `Created` column accepts RFC 3339 timestamps (`2024-02-01T20:00:00Z`),
plain date-times (`2024-02-01 20:00:00`) and plain dates (`2024-02-01`).
In Excel, date cells are accepted as well.

A missing table, a missing column, a negative number of points or an
unreadable date stops the program. Dangling references (a vote on a track that
nobody submitted, a submitter that is not a competitor) are only reported in the
logs: the tables that need them skip the row or show an empty name.

## Tables

The tables do not all join votes the same way:
* the leaderboard, the vote allocation and the vote matrix attribute a vote to
  the submitter of this track _in the round of the vote_.
* the snubs, the explorer and the player profile use the points of a track
  summed over all the rounds.
* the hate points work round by round.

Ties are always kept in the order of the input.

### Participation

The number of distinct submitters per round, oldest round first. Rounds
without submissions are listed with 0.

### Leaderboard

The points received by each competitor. Competitors who received nothing are
not listed. The `leaderboard_top` table is the head of the leaderboard
(`topLeaderboard` rows).

### Snubs

A song is snubbed when it received no point at all. The ranked table only
includes the competitors with at least `snubMinSubmissions` submissions and
sorts them by snub rate. The unranked table lists everyone with at least one
snubbed song, by number of snubbed songs.

### Explorer

One row per submission, with the primary artist (the first name of the artist
list) and the points of the track. It can be narrowed down by competitor and by
round. The value `All` removes a filter.

### Player profile

For one competitor: the total and average points of their songs, their best
and worst songs (`topSongsPerPlayer` each), and the competitors who gave them
the most points.

### Hate points

For a player P and another competitor H, in each round:

```text
voting power = all the points H gave in the round
hate points  = voting power - points H gave to the songs of P in the round
```

A round counts only if H voted in it and P submitted something in it.
Competitors with `hateThreshold` hate points or fewer are not listed. The hate
percentage is computed over the voting power of the rounds H voted in. When
nobody is left, the outcome is `no meaningful haters`.

The analysis looks at every (competitor, round) pair and refuses to run on
seasons with more than `maxHateCells` of them.

### Vote allocation

The same question over the whole season: of all the points H gave, how many
went to P. Competitors who never voted are not listed. Rows are sorted by hate
points.

### Metrics

The number of votes, submissions and competitors, the average points per
song (over the songs that appear in the votes) and per voter, the most
submitted artists (`topArtists`), the songs submitted more than once and the
most submitted titles (`topSongs`), and the matrix of points from every voter
to every submitter.

## Configuration

`mlstats` comes with sensible defaults, and a season can be read with no
configuration at all:

```text
mlstats --season path/to/season --player Ann
```

A JSON configuration file describes a season and its rules:

```text
{
  "seasonName": "Season 3",
  "dataDirectory": "data",
  "provider": "csv",
  "rules": {
    "snubMinSubmissions": 2,
    "hateThreshold": 1,
    "topHaters": 5,
    "topSongsPerPlayer": 5,
    "topArtists": 10,
    "topSongs": 10,
    "topLeaderboard": 10,
    "maxHateCells": 1000000
  }
}
```

- `dataDirectory` (string, optional): relative to the configuration file.
- `provider` (string, optional): `csv` or `xlsx`.
- `workbookPath` (string, required for `xlsx`): relative to the data directory.
- `rules` (optional): every value is optional and takes the default above.

The command line overrides the configuration file: `--season` replaces the
data location and `--input-type` the provider.

## Output

The summary is one JSON object, written to `--out` or printed. Its rows use
the column names of the tables above. The vote matrix is written as the list
of voters, the list of submitters and one row of points per voter. With `--reference`, the summary is
compared with a previously computed one and the differences are printed.

 */
