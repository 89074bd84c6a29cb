/// Compare two byte strings in constant time so hardware id checks do
/// not leak how many leading bytes matched.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_inputs() {
        assert!(constant_time_eq(b"machine-a", b"machine-a"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_different_inputs() {
        assert!(!constant_time_eq(b"machine-a", b"machine-b"));
        assert!(!constant_time_eq(b"Machine-a", b"machine-a"));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!constant_time_eq(b"short", b"much-longer-value"));
    }
}
