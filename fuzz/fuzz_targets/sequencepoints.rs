#![no_main]

use libfuzzer_sys::fuzz_target;
use pdbscope::metadata::{
    document::parse_document_name,
    sequencepoints::{parse_sequence_points, SequencePoints},
    token::Token,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(records) = parse_sequence_points(data, 0) {
        let points = SequencePoints::from_records(Token::method_def(1), &records, 0x1000, |_| None);
        let _ = points.find_by_offset(0x10);
        let _ = points.ignored_ranges();
    }

    let _ = parse_document_name(data, |index| Ok(&data[..(index as usize).min(data.len())]));
});
