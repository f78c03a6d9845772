#![no_main]
use evotrace_core::{RecordLayout, TraceError};
use evotrace_trace::reader::RecordReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for layout in [RecordLayout::Plain, RecordLayout::Counted] {
        let Ok(rdr) = RecordReader::open(data, layout) else {
            continue;
        };
        let mut n = 0u64;
        for item in rdr {
            match item {
                Ok(_) => n += 1,
                Err(e) => {
                    assert!(
                        matches!(e, TraceError::TruncatedRecord { .. }),
                        "in-memory decode can only fail by truncation"
                    );
                    assert_eq!(e.records_decoded(), Some(n));
                }
            }
        }
    }
});
