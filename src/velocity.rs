use crate::history::HistoryBuffer;

/// Average absolute rate of change over the trailing window `(limit, now]`,
/// in value units per second.
///
/// Scans adjacent sample pairs newest-to-oldest. A pair wholly inside the
/// window contributes `|dv| / dt`; the first pair whose older endpoint falls
/// before the window start contributes the same per-segment rate and ends
/// the scan, since the window is covered from there on. The result is the
/// plain mean of per-segment rates. Segments are not weighted by duration.
pub fn velocity_since(history: &HistoryBuffer, limit: f64) -> f32 {
    let mut sum: f32 = 0.0;
    let mut count: u32 = 0;

    let newer_iter = history.entries();
    let older_iter = history.entries().skip(1);
    for (newer, older) in newer_iter.zip(older_iter) {
        if newer.timestamp <= limit {
            break;
        }

        let dv = (newer.value - older.value).abs() as f64;
        let dt = newer.timestamp - older.timestamp;

        if older.timestamp >= limit {
            // whole segment inside the window
            if dt > 0.0 {
                sum += (dv / dt) as f32;
                count += 1;
            }
        } else {
            // segment straddles the window start; the overlap decides
            // inclusion, the rate stays the segment's own
            let overlap = newer.timestamp - limit;
            if overlap > 0.0 {
                sum += (dv / dt) as f32;
                count += 1;
            }
            break;
        }
    }

    if count > 0 { sum / count as f32 } else { 0.0 }
}
