/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! bounded sampling of CSV data. We only look at the first `max_rows` records of an object (which
//! is usually also truncated to a max number of bytes), but records are parsed RFC 4180 compliant,
//! i.e. quoted fields can contain separators, quotes and line breaks.

use std::collections::BTreeMap;
use csv::{ByteRecord, ReaderBuilder, Trim};
use serde::Serialize;
use tracing::debug;

/// one data record of a sample. Always has exactly as many fields as the sample has headers
#[derive(Debug,Clone,PartialEq,Serialize)]
#[serde(transparent)]
pub struct ParsedRow {
    pub fields: Vec<String>
}

impl ParsedRow {
    pub fn get (&self, idx: usize)->&str {
        self.fields.get(idx).map( |s| s.as_str()).unwrap_or("")
    }
}

#[derive(Debug,Clone,Default,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvSample {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
    /// records that could not be parsed and were skipped
    pub skipped_records: usize,
    /// true if the sample does not cover all of the input (row limit or truncated bytes)
    pub partial: bool
}

impl CsvSample {
    pub fn len (&self)->usize { self.rows.len() }
    pub fn is_empty (&self)->bool { self.rows.is_empty() }

    pub fn column_index (&self, header: &str)->Option<usize> {
        self.headers.iter().position( |h| h.eq_ignore_ascii_case(header))
    }

    /// field value of `row` in `column`, empty if the column does not exist
    pub fn value<'a> (&self, row: &'a ParsedRow, column: &str)->&'a str {
        self.column_index(column).map( |idx| row.get(idx)).unwrap_or("")
    }

    /// header -> value maps for all rows. Duplicated headers keep the last value
    pub fn to_maps (&self)->Vec<BTreeMap<String,String>> {
        self.rows.iter().map( |row| {
            self.headers.iter().cloned().zip( row.fields.iter().cloned()).collect()
        }).collect()
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// parse the header and up to `max_rows` data records from `data`.
///
/// If `truncated` is set the data was cut off at some byte limit, in which case the record that
/// extends to the end of the data is incomplete and is dropped. This includes records that end
/// within an open quoted field.
/// Missing fields are padded with empty strings, extra fields are dropped. Invalid UTF-8 is
/// replaced, leading and trailing whitespace of fields is removed. This never fails - unparsable
/// records are skipped and counted.
pub fn sample_csv (data: &[u8], max_rows: usize, truncated: bool)->CsvSample {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let data_len = data.len() as u64;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let headers: Vec<String> = match reader.byte_headers() {
        Ok(rec) => rec.iter().map( |f| String::from_utf8_lossy(f).into_owned()).collect(),
        Err(e) => {
            debug!("no valid CSV header: {e}");
            return CsvSample { partial: truncated, ..Default::default() }
        }
    };
    // not even a complete header line
    let header_cut = truncated && reader.position().byte() >= data_len && !data.ends_with(b"\n");
    if header_cut || headers.iter().all( |h| h.is_empty()) {
        return CsvSample { partial: truncated, ..Default::default() }
    }

    let n_cols = headers.len();
    let mut rows: Vec<ParsedRow> = Vec::new();
    let mut skipped_records = 0;
    let mut partial = truncated;
    let mut rec = ByteRecord::new();

    loop {
        match reader.read_byte_record( &mut rec) {
            Ok(true) => {
                if truncated && reader.position().byte() >= data_len {
                    break // the record was cut off
                }
                if rows.len() >= max_rows {
                    partial = true;
                    break
                }
                let mut fields: Vec<String> = rec.iter().take(n_cols).map( |f| String::from_utf8_lossy(f).into_owned()).collect();
                fields.resize( n_cols, String::new());
                rows.push( ParsedRow { fields });
            }
            Ok(false) => break,
            Err(e) => {
                debug!("skipping CSV record: {e}");
                skipped_records += 1;
                if e.is_io_error() { break }
            }
        }
    }

    CsvSample { headers, rows, skipped_records, partial }
}
