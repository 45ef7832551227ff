use std::io::Read;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::error::ImportError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Pick the field delimiter from a header line.
///
/// Tab wins over semicolon, and comma is the fallback because it also shows
/// up inside unquoted free text.
pub fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.contains('\t') {
        b'\t'
    } else if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

/// One non-blank data line of a CSV table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// Position among non-blank rows; the header is row 1
    pub number: usize,
    pub cells: Vec<String>,
}

impl CsvRow {
    pub fn new(number: usize, cells: Vec<String>) -> Self {
        Self { number, cells }
    }

    /// Cell at `index`, trimmed, or empty when the row is too short
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(|c| c.trim()).unwrap_or("")
    }
}

/// Lazily reads the data rows of a CSV table whose header has already been
/// consumed. Rows may be shorter or longer than the header.
pub struct CsvTableReader<R> {
    delimiter: u8,
    header: Vec<String>,
    records: StringRecordsIntoIter<R>,
    next_number: usize,
}

impl<'a> CsvTableReader<&'a [u8]> {
    /// Decode an uploaded payload and sniff its delimiter from the header line
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, ImportError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)?;

        // Whitespace-only lines ahead of the header are blank, but the csv
        // reader would take them as the header row, so start past them.
        let mut offset = 0;
        let mut header_line = None;
        for line in text.split_inclusive('\n') {
            if !line.trim().is_empty() {
                header_line = Some(line);
                break;
            }
            offset += line.len();
        }
        let header_line = header_line.ok_or(ImportError::MissingHeader)?;

        Self::new(&bytes[offset..], detect_delimiter(header_line))
    }
}

impl<R: Read> CsvTableReader<R> {
    pub fn new(reader: R, delimiter: u8) -> Result<Self, ImportError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header: Vec<String> = reader
            .headers()
            .map_err(ImportError::csv)?
            .iter()
            .map(|name| name.trim().to_string())
            .collect();

        if header.iter().all(|name| name.is_empty()) {
            return Err(ImportError::MissingHeader);
        }

        Ok(Self {
            delimiter,
            header,
            records: reader.into_records(),
            next_number: 2,
        })
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

impl<R: Read> Iterator for CsvTableReader<R> {
    type Item = Result<CsvRow, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(ImportError::csv(e))),
            };

            if is_blank(&record) {
                continue;
            }

            let number = self.next_number;
            self.next_number += 1;

            return Some(Ok(CsvRow::new(
                number,
                record.iter().map(str::to_string).collect(),
            )));
        }
    }
}
