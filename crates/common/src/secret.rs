//! Helpers for comparing shared secrets without leaking timing information.

/// Constant-time string comparison.
///
/// Length differences return early; the contents of equal-length inputs are
/// always fully scanned.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_match() {
        assert!(constant_time_eq("s3cr3t", "s3cr3t"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn different_strings_do_not_match() {
        assert!(!constant_time_eq("s3cr3t", "s3cr3T"));
        assert!(!constant_time_eq("s3cr3t", "s3cr3"));
        assert!(!constant_time_eq("", "x"));
    }
}
