//! Range classification of object sizes and ages into fixed buckets.
use chrono::{DateTime, Months, Utc};

/// Ordered labels of every size range, smallest first.
pub const SIZE_LABELS: [&str; 10] = [
    "<1KB",
    "1KB-10KB",
    "10KB-100KB",
    "100KB-1MB",
    "1MB-10MB",
    "10MB-100MB",
    "100MB-1GB",
    "1GB-10GB",
    "10GB-100GB",
    "100GB+",
];

/// Ordered labels of every age range, youngest first.
pub const AGE_LABELS: [&str; 11] = [
    "<1 month",
    "1-2 month",
    "2-3 month",
    "3-6 month",
    "6-9 month",
    "9-12 month",
    "1-2 year",
    "2-3 year",
    "3-4 year",
    "4-5 year",
    ">5 year",
];

/// Lower (inclusive) byte bound of each size range after `<1KB`.
const SIZE_CUTOFFS: [u64; 9] = [
    1024,
    10240,
    102400,
    1048576,
    10485760,
    104857600,
    1073741824,
    10737418240,
    107374182400,
];

/// Months subtracted from the reference instant for each age range boundary.
const AGE_OFFSETS: [u32; 10] = [1, 2, 3, 6, 9, 12, 24, 36, 48, 60];

/// Returns the size range label for a byte count.
pub fn classify_size(bytes: u64) -> &'static str {
    // walk down from the largest bound, the first hit wins
    for (idx, cutoff) in SIZE_CUTOFFS.iter().enumerate().rev() {
        if bytes >= *cutoff {
            return SIZE_LABELS[idx + 1];
        }
    }
    SIZE_LABELS[0]
}

/// Age boundaries fixed at a single reference instant.
///
/// All boundaries are computed once on construction, so every timestamp
/// classified through the same `AgeRanges` is measured against the same
/// "now", no matter how long the run takes.
#[derive(Clone, Debug)]
pub struct AgeRanges {
    // boundaries[i] is "now minus AGE_OFFSETS[i] months"
    boundaries: [DateTime<Utc>; 10],
}

impl AgeRanges {
    /// Constructs `AgeRanges` relative to the current time.
    pub fn now() -> AgeRanges {
        AgeRanges::at(Utc::now())
    }

    /// Constructs `AgeRanges` relative to the provided instant.
    pub fn at(now: DateTime<Utc>) -> AgeRanges {
        let mut boundaries = [now; 10];
        for (boundary, months) in boundaries.iter_mut().zip(AGE_OFFSETS.iter()) {
            *boundary = now
                .checked_sub_months(Months::new(*months))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
        }
        AgeRanges { boundaries }
    }

    /// Returns the age range label for a modification timestamp.
    pub fn classify(&self, timestamp: &DateTime<Utc>) -> &'static str {
        // oldest boundary first; anything before it is older than the range
        for (idx, boundary) in self.boundaries.iter().enumerate().rev() {
            if timestamp < boundary {
                return AGE_LABELS[idx + 1];
            }
        }
        AGE_LABELS[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn classifying_size_boundaries() {
        assert_eq!(classify_size(0), "<1KB");
        assert_eq!(classify_size(1023), "<1KB");
        assert_eq!(classify_size(1024), "1KB-10KB");
        assert_eq!(classify_size(10239), "1KB-10KB");
        assert_eq!(classify_size(10240), "10KB-100KB");
        assert_eq!(classify_size(102400), "100KB-1MB");
        assert_eq!(classify_size(1048576), "1MB-10MB");
        assert_eq!(classify_size(10485760), "10MB-100MB");
        assert_eq!(classify_size(104857599), "10MB-100MB");
        assert_eq!(classify_size(104857600), "100MB-1GB");
        assert_eq!(classify_size(1073741824), "1GB-10GB");
        assert_eq!(classify_size(10737418240), "10GB-100GB");
        assert_eq!(classify_size(107374182399), "10GB-100GB");
        assert_eq!(classify_size(107374182400), "100GB+");
        assert_eq!(classify_size(u64::MAX), "100GB+");
    }

    #[test]
    fn classifying_size_within_documented_range() {
        let mut lower = vec![0];
        lower.extend_from_slice(&SIZE_CUTOFFS);

        let mut upper = SIZE_CUTOFFS.to_vec();
        upper.push(u64::MAX);

        for (idx, label) in SIZE_LABELS.iter().enumerate() {
            let (low, high) = (lower[idx], upper[idx]);
            for value in &[low, low + 1, (low / 2) + (high / 2), high - 1] {
                assert_eq!(classify_size(*value), *label, "size {}", value);
            }
        }
    }

    #[test]
    fn classifying_age_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let ranges = AgeRanges::at(now);

        let cases = [
            (now, "<1 month"),
            (now - Duration::days(10), "<1 month"),
            (Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap(), "<1 month"),
            (Utc.with_ymd_and_hms(2024, 5, 15, 11, 59, 59).unwrap(), "1-2 month"),
            (Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(), "2-3 month"),
            (Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), "3-6 month"),
            (Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap(), "6-9 month"),
            (Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap(), "9-12 month"),
            (Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(), "1-2 year"),
            (Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(), "2-3 year"),
            (Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(), "3-4 year"),
            (Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), "4-5 year"),
            (Utc.with_ymd_and_hms(2019, 6, 15, 12, 0, 0).unwrap(), "4-5 year"),
            (Utc.with_ymd_and_hms(2019, 6, 15, 11, 59, 59).unwrap(), ">5 year"),
            (Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(), ">5 year"),
        ];

        for (timestamp, label) in cases.iter() {
            assert_eq!(ranges.classify(timestamp), *label, "timestamp {}", timestamp);
        }
    }

    #[test]
    fn classifying_future_age() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let ranges = AgeRanges::at(now);

        assert_eq!(ranges.classify(&(now + Duration::days(400))), "<1 month");
    }
}
