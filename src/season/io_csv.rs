// Primitives for reading CSV files.

use crate::season::io_common::{check_columns, SeasonTable, TableSource};
use crate::season::*;

/// A directory with one CSV file per table, named after the table.
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: &Path) -> CsvDirectory {
        CsvDirectory {
            dir: dir.to_path_buf(),
        }
    }
}

impl TableSource for CsvDirectory {
    fn read_table<T: SeasonTable>(&mut self) -> StatsResult<Vec<T>> {
        let path = self.dir.join(format!("{}.csv", T::NAME));
        let p = path.display().to_string();
        info!("Attempting to read table {:?}", p);
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .context(CsvOpenSnafu { path: p })?;
        let header = rdr
            .headers()
            .context(CsvLineParseSnafu {
                table: T::NAME,
                lineno: 1usize,
            })?
            .clone();
        check_columns::<T>(&header)?;

        let mut res: Vec<T> = Vec::new();
        for (idx, line_r) in rdr.deserialize::<T>().enumerate() {
            let lineno = idx + 2;
            let line = line_r.context(CsvLineParseSnafu {
                table: T::NAME,
                lineno,
            })?;
            debug!("read_table: {}: lineno: {:?} row: {:?}", T::NAME, lineno, line);
            res.push(line);
        }
        Ok(res)
    }
}
