//! Message timestamps.
//!
//! `std::time::SystemTime` is unavailable on `wasm32-unknown-unknown`, so
//! the browser build reads the clock through `js_sys::Date`.

/// Current Unix time in milliseconds
pub fn now_timestamp_millis() -> i64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as i64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_millis_is_reasonable() {
        let ts = now_timestamp_millis();
        // After 2024-01-01, before 2100-01-01
        assert!(ts > 1_704_067_200_000, "Timestamp {} is too old", ts);
        assert!(ts < 4_102_444_800_000, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_now_timestamp_millis_is_monotonic_enough() {
        let a = now_timestamp_millis();
        let b = now_timestamp_millis();
        assert!(b >= a);
    }
}
