use std::{fs, io};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

pub(crate) fn file_to_vec<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
    let file_in = fs::File::open(filename)?;
    let file_reader = BufReader::new(file_in);
    file_reader.lines().collect()
}

/// Logs the time spent in one pipeline step and returns the new checkpoint.
pub(crate) fn trace(l_step: &str, started: Instant, checkpoint: Duration) -> Duration {
    let now = started.elapsed();
    log::trace!("TIME | Total={:.2?} | {}={:.2?}", now, l_step, now.saturating_sub(checkpoint));
    now
}
