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

use eos_agri::csv_sampler::sample_csv;

// run with "cargo test -p eos_agri --test test_csv_sampler -- --nocapture"

#[test]
fn test_quoted_fields_stay_intact() {
    // a naive split on ',' would shift all fields after "Use, total"
    let data = b"Country,\"Use, total\",Note\nBrazil,\"5,871,000\",\"said \"\"ok\"\"\"\n\"Korea, Republic of\",12,\"two\nlines\"\n";
    let sample = sample_csv( data, 100, false);
    println!("{sample:#?}");

    assert_eq!( sample.headers, vec!["Country", "Use, total", "Note"]);
    assert_eq!( sample.len(), 2);
    assert_eq!( sample.rows[0].fields, vec!["Brazil", "5,871,000", "said \"ok\""]);
    assert_eq!( sample.rows[1].get(0), "Korea, Republic of");
    assert_eq!( sample.rows[1].get(2), "two\nlines");
    assert_eq!( sample.value( &sample.rows[0], "use, total"), "5,871,000");
}

#[test]
fn test_rows_match_header_count() {
    let data = b"a,b,c\n1\n1,2\n1,2,3\n1,2,3,4,5\n";
    let sample = sample_csv( data, 100, false);

    assert_eq!( sample.len(), 4);
    for row in &sample.rows {
        assert_eq!( row.fields.len(), sample.headers.len());
    }
    assert_eq!( sample.rows[0].fields, vec!["1", "", ""]);
    assert_eq!( sample.rows[3].fields, vec!["1", "2", "3"]);
    assert_eq!( sample.skipped_records, 0);
}

#[test]
fn test_row_limit_and_truncation() {
    let data = b"name,val\na,1\nb,2\nc,3\n";
    let sample = sample_csv( data, 2, false);
    assert_eq!( sample.len(), 2);
    assert!( sample.partial);

    let sample = sample_csv( data, 10, false);
    assert_eq!( sample.len(), 3);
    assert!( !sample.partial);

    // byte truncated input: the incomplete last record is dropped
    let sample = sample_csv( b"name,val\na,1\nb,2\nc,3", 10, true);
    assert_eq!( sample.len(), 2);
    assert!( sample.partial);
    assert_eq!( sample.rows[1].fields, vec!["b", "2"]);

    // cut off within a quoted field that spans lines
    let sample = sample_csv( b"Country,Note\nBrazil,ok\nArgentina,\"first line\nsecond li", 100, true);
    assert_eq!( sample.len(), 1);
    assert_eq!( sample.rows[0].fields, vec!["Brazil", "ok"]);
    assert!( sample.partial);

    // the same data read completely keeps the quoted line break
    let sample = sample_csv( b"Country,Note\nBrazil,ok\nArgentina,\"first line\nsecond line\"\n", 100, false);
    assert_eq!( sample.len(), 2);
    assert_eq!( sample.rows[1].fields, vec!["Argentina", "first line\nsecond line"]);

    // not even a complete header line
    let sample = sample_csv( b"name,v", 10, true);
    assert!( sample.headers.is_empty());
    assert!( sample.is_empty());
}

#[test]
fn test_lenient_decoding() {
    let data = b"\xEF\xBB\xBF Area , Value \n  Brazil  ,\xFF12\n\n,\n";
    let sample = sample_csv( data, 10, false);

    assert_eq!( sample.headers, vec!["Area", "Value"]);
    assert_eq!( sample.rows[0].get(0), "Brazil");
    assert!( sample.rows[0].get(1).ends_with("12")); // invalid UTF-8 is replaced, not rejected
    assert_eq!( sample.len(), 2); // blank lines are skipped, ',' is an (empty) record

    let maps = sample.to_maps();
    assert_eq!( maps[0].get("Area").map( |s| s.as_str()), Some("Brazil"));
}

#[test]
fn test_empty_input() {
    let sample = sample_csv( b"", 10, false);
    assert!( sample.headers.is_empty());
    assert!( sample.is_empty());
}
