// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

/// For timestamps, we use the time crate's implementation of ISO 8601 with default config.
///
/// In default config:
/// - The time has precision to the second and nine decimal digits.
///
/// So the width is fixed, unlike the default `Display` impl. These are used for
/// submission lifecycle lines (submitted / ready / failed) so that a run can be
/// lined up against predictor-side logs.
#[macro_export]
macro_rules! info_with_timestamp {
    ($fmt:expr $(, $args:expr)*) => {
        $crate::log::info!(concat!("{_when}: ", $fmt) $(, $args)*,
            _when=$crate::logging::now_iso8601())
    };
}

/// Current UTC time as ISO 8601. Falls back to the unix timestamp if the
/// formatter ever refuses the value.
pub fn now_iso8601() -> String {
    let now = time::OffsetDateTime::now_utc();
    now.format(&time::format_description::well_known::Iso8601::DEFAULT)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::now_iso8601;

    #[test]
    fn timestamp_is_iso8601() {
        let stamp = now_iso8601();
        // e.g. 2024-05-01T12:34:56.123456789Z
        assert!(stamp.contains('T'), "{stamp}");
        assert!(stamp.ends_with('Z'), "{stamp}");
    }
}
