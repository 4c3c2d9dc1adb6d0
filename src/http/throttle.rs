//! Transfer rate limiting for file bodies.
//!
//! A requested rate in kilobytes per second is approximated by sending one
//! chunk per sampling period, sized so that `chunk_size / period == rate`.

use std::time::Duration;

/// Chunk size used when no rate is requested.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Sampling period of the rate limiter, in seconds.
pub const SAMPLE_PERIOD: f64 = 0.1;

/// Upper bound on a single throttled chunk.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Bytes read and written per body-pump step
    pub chunk_size: usize,
    /// Pause after each written chunk
    pub delay: Duration,
}

impl Throttle {
    pub fn unthrottled() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            delay: Duration::ZERO,
        }
    }

    /// Derives a throttle from the `rate` query parameter value.
    ///
    /// The value is read leniently: the longest leading decimal number is
    /// used and anything after it is ignored, so `100kb` means 100. Missing,
    /// non-numeric, non-positive or overflowing rates fall back to
    /// [`Throttle::unthrottled`].
    ///
    /// # Example
    ///
    /// ```
    /// # use mediaserve::http::throttle::Throttle;
    /// # use std::time::Duration;
    /// let t = Throttle::from_rate(Some("100"));
    /// assert_eq!(t.chunk_size, 10240);
    /// assert_eq!(t.delay, Duration::from_millis(100));
    /// ```
    pub fn from_rate(rate: Option<&str>) -> Self {
        let Some(rate) = rate.map(parse_leading_f64) else {
            return Self::unthrottled();
        };
        if !rate.is_finite() || rate <= 0.0 {
            return Self::unthrottled();
        }

        let chunk_size = (rate * 1024.0 * SAMPLE_PERIOD) as usize;
        Self {
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
            delay: Duration::from_millis((SAMPLE_PERIOD * 1000.0) as u64),
        }
    }

    pub fn is_throttled(&self) -> bool {
        !self.delay.is_zero()
    }
}

/// Reads the longest decimal floating-point prefix of `s`: optional sign,
/// digits with an optional fraction, then an optional exponent. Leading
/// whitespace is skipped. Yields 0 when no digits are present.
fn parse_leading_f64(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = match bytes.first() {
        Some(b'+' | b'-') => 1,
        _ => 0,
    };
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - end - 1;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

impl Default for Throttle {
    fn default() -> Self {
        Self::unthrottled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_rate() {
        let t = Throttle::from_rate(Some("2.5"));
        assert_eq!(t.chunk_size, 256);
        assert!(t.is_throttled());
    }

    #[test]
    fn tiny_rate_still_makes_progress() {
        let t = Throttle::from_rate(Some("0.001"));
        assert_eq!(t.chunk_size, 1);
    }

    #[test]
    fn rate_with_trailing_text() {
        let t = Throttle::from_rate(Some("100kb"));
        assert_eq!(t.chunk_size, 10240);
        assert_eq!(t.delay, Duration::from_millis(100));

        assert_eq!(Throttle::from_rate(Some("50x")).chunk_size, 5120);
        assert_eq!(Throttle::from_rate(Some(" 2.5KB/s")).chunk_size, 256);
    }

    #[test]
    fn leading_float_prefix() {
        assert_eq!(parse_leading_f64("100"), 100.0);
        assert_eq!(parse_leading_f64("  100kb"), 100.0);
        assert_eq!(parse_leading_f64("-1.5"), -1.5);
        assert_eq!(parse_leading_f64(".5"), 0.5);
        assert_eq!(parse_leading_f64("5."), 5.0);
        assert_eq!(parse_leading_f64("1e2"), 100.0);
        assert_eq!(parse_leading_f64("1E+2x"), 100.0);
        assert_eq!(parse_leading_f64("3e"), 3.0);
        assert_eq!(parse_leading_f64("3e-"), 3.0);
        assert_eq!(parse_leading_f64("abc"), 0.0);
        assert_eq!(parse_leading_f64("."), 0.0);
        assert_eq!(parse_leading_f64("-"), 0.0);
        assert_eq!(parse_leading_f64(""), 0.0);
    }

    #[test]
    fn rejects_bad_rates() {
        for rate in ["0", "-3", "abc", "", "inf", "NaN", "kb100", "1e999"] {
            assert_eq!(Throttle::from_rate(Some(rate)), Throttle::unthrottled(), "{rate}");
        }
        assert_eq!(Throttle::from_rate(None), Throttle::unthrottled());
    }
}
