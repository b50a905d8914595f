// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Date-partition naming for the append-only log tree.

use chrono::{DateTime, Utc};

/// The `YYYY-MM-DD` partition name a timestamp falls into, UTC.
pub fn date_partition(epoch_ms: u64) -> String {
    let millis = epoch_ms.min(i64::MAX as u64) as i64;
    let dt = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_else(|| {
        DateTime::<Utc>::from_timestamp(0, 0).expect("epoch zero is always representable")
    });
    dt.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_year_month_day() {
        // 2026-07-26T00:00:00Z
        assert_eq!(date_partition(1_785_024_000_000), "2026-07-26");
    }

    #[test]
    fn falls_back_to_epoch_on_an_unrepresentable_timestamp() {
        assert_eq!(date_partition(u64::MAX), "1970-01-01");
    }
}
