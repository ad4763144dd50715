//! Exercises the segment reader's public surface through the `soundsys`
//! façade, the same path a host feeding segment files to the engine would
//! take.

use std::io::Write;

use soundsys::SoundSys;

#[test]
fn reading_a_missing_segment_file_fails_cleanly() {
    let sys = SoundSys::new();
    let result = sys.read_segment(std::path::Path::new("/nonexistent/path/does-not-exist.sgt"));
    assert!(result.is_err());
}

#[test]
fn reading_a_non_riff_file_reports_a_format_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"not a riff segment at all").unwrap();

    let sys = SoundSys::new();
    let result = sys.read_segment(file.path());
    assert!(result.is_err());
}
