// Reading a season from an Excel workbook with one worksheet per table.
//
// The cells are turned into CSV records, so that both providers share the
// same record types.

use std::fs::File;
use std::io::BufReader;

use calamine::{open_workbook, DataType, Reader, Xlsx};
use csv::StringRecord;

use crate::season::io_common::{check_columns, SeasonTable, TableSource};
use crate::season::*;

pub struct XlsxWorkbook {
    path: String,
    workbook: Xlsx<BufReader<File>>,
}

impl XlsxWorkbook {
    pub fn open(path: &Path) -> StatsResult<XlsxWorkbook> {
        let p = path.display().to_string();
        let workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path: p.clone() })?;
        Ok(XlsxWorkbook { path: p, workbook })
    }
}

impl TableSource for XlsxWorkbook {
    fn read_table<T: SeasonTable>(&mut self) -> StatsResult<Vec<T>> {
        debug!("read_table: path: {:?} worksheet: {:?}", &self.path, T::NAME);
        let wrange = self
            .workbook
            .worksheet_range(T::NAME)
            .context(MissingWorksheetSnafu {
                name: T::NAME,
                path: self.path.clone(),
            })?
            .context(OpeningExcelSnafu {
                path: self.path.clone(),
            })?;

        let mut rows = wrange.rows();
        let header = match rows.next() {
            Some(cells) => cells_to_record(T::NAME, 1, cells)?,
            None => StringRecord::new(),
        };
        debug!("read_table: header: {:?}", header);
        check_columns::<T>(&header)?;

        let mut res: Vec<T> = Vec::new();
        for (idx, cells) in rows.enumerate() {
            let lineno = idx + 2;
            if cells.iter().all(|c| *c == DataType::Empty) {
                continue;
            }
            let record = cells_to_record(T::NAME, lineno, cells)?;
            let line: T = record
                .deserialize(Some(&header))
                .context(CsvLineParseSnafu {
                    table: T::NAME,
                    lineno,
                })?;
            debug!("read_table: {}: lineno: {:?} row: {:?}", T::NAME, lineno, line);
            res.push(line);
        }
        Ok(res)
    }
}

fn cells_to_record(table: &str, lineno: usize, cells: &[DataType]) -> StatsResult<StringRecord> {
    let mut record = StringRecord::new();
    for (idx, cell) in cells.iter().enumerate() {
        let s = cell_to_string(cell).context(WrongCellTypeSnafu {
            table,
            lineno,
            column: idx + 1,
            content: format!("{:?}", cell),
        })?;
        record.push_field(&s);
    }
    Ok(record)
}

fn cell_to_string(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        // Ids and points are stored as floats by most spreadsheets.
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        DataType::Empty => Some(String::new()),
        _ => None,
    }
}
