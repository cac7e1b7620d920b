//! Sequential short key generation
//!
//! Keys are written over the 36-symbol alphabet `0-9a-z` and advance like an
//! odometer: `"0"`, `"1"`, ..., `"z"`, `"00"`, `"01"`, ..., `"zz"`, `"000"`.
//! Ordering is by length first, then lexicographic, and every key up to the
//! configured maximum length is produced exactly once.

use tracing::trace;

use crate::errors::{LinkError, Result};

/// 键字母表：数字在前，小写字母在后
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const FIRST_DIGIT: u8 = 0;
const LAST_DIGIT: u8 = (ALPHABET.len() - 1) as u8;
const BASE: u64 = ALPHABET.len() as u64;

fn symbol_digit(symbol: u8) -> Option<u8> {
    match symbol {
        b'0'..=b'9' => Some(symbol - b'0'),
        b'a'..=b'z' => Some(symbol - b'a' + 10),
        _ => None,
    }
}

fn parse_digits(key: &str) -> Result<Vec<u8>> {
    key.bytes()
        .map(|symbol| {
            symbol_digit(symbol).ok_or_else(|| {
                LinkError::invalid_key(format!(
                    "key '{}' contains a symbol outside of 0-9a-z",
                    key
                ))
            })
        })
        .collect()
}

fn render(digits: &[u8]) -> String {
    digits
        .iter()
        .map(|&d| ALPHABET[d as usize] as char)
        .collect()
}

fn exhausted(max_key_length: usize) -> LinkError {
    LinkError::key_space_exhausted(format!(
        "no keys left within max key length {}",
        max_key_length
    ))
}

/// Returns the key that follows `last_key`.
///
/// An empty `last_key` means nothing was assigned yet. Keys longer than
/// `max_key_length` are never produced.
pub fn next_key(last_key: &str, max_key_length: usize) -> Result<String> {
    let mut digits = parse_digits(last_key)?;

    if digits.len() > max_key_length {
        return Err(exhausted(max_key_length));
    }

    for i in (0..digits.len()).rev() {
        if digits[i] == LAST_DIGIT {
            digits[i] = FIRST_DIGIT;
        } else {
            digits[i] += 1;
            return Ok(render(&digits));
        }
    }

    // 全部进位（或起始空键），长度加一
    if digits.len() >= max_key_length {
        return Err(exhausted(max_key_length));
    }
    digits.insert(0, FIRST_DIGIT);

    Ok(render(&digits))
}

/// Position of `key` in generation order, `""` being 0 and `"0"` being 1.
///
/// Returns `None` for symbols outside the alphabet or on overflow.
pub fn key_ordinal(key: &str) -> Option<u64> {
    key.bytes().try_fold(0u64, |acc, symbol| {
        let digit = symbol_digit(symbol)? as u64;
        acc.checked_mul(BASE)?.checked_add(digit + 1)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyGenerator {
    max_key_length: usize,
}

impl KeyGenerator {
    pub fn new(max_key_length: usize) -> Self {
        Self { max_key_length }
    }

    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    /// Number of distinct keys this generator can hand out (saturating).
    pub fn capacity(&self) -> u64 {
        let lengths = u32::try_from(self.max_key_length).unwrap_or(u32::MAX);
        let mut total = 0u64;
        for len in 1..=lengths {
            total = total.saturating_add(BASE.saturating_pow(len));
            if total == u64::MAX {
                break;
            }
        }
        total
    }

    pub fn generate(&self, last_key: &str) -> Result<String> {
        next_key(last_key, self.max_key_length)
    }

    /// Assigns consecutive keys to `urls`, starting after `last_key`.
    ///
    /// Fails as a whole on the first exhausted key; no partial batch is
    /// returned.
    pub fn generate_batch(&self, last_key: &str, urls: &[String]) -> Result<Vec<(String, String)>> {
        let mut batch = Vec::with_capacity(urls.len());
        let mut current = last_key.to_string();

        for url in urls {
            let key = self.generate(&current)?;
            batch.push((key.clone(), url.clone()));
            current = key;
        }

        trace!(
            "Generated batch of {} keys after '{}' (last: '{}')",
            batch.len(),
            last_key,
            current
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_key() {
        assert_eq!(next_key("", 3).unwrap(), "0");
    }

    #[test]
    fn test_digit_to_letter() {
        assert_eq!(next_key("9", 3).unwrap(), "a");
        assert_eq!(next_key("0", 3).unwrap(), "1");
        assert_eq!(next_key("y", 3).unwrap(), "z");
    }

    #[test]
    fn test_rollover_grows_key() {
        assert_eq!(next_key("z", 2).unwrap(), "00");
        assert_eq!(next_key("0z", 2).unwrap(), "10");
        assert_eq!(next_key("zz", 3).unwrap(), "000");
        assert_eq!(next_key("a9z", 3).unwrap(), "aa0");
    }

    #[test]
    fn test_limit_reached() {
        let err = next_key("zz", 2).unwrap_err();
        assert!(matches!(err, LinkError::KeySpaceExhausted(_)));
        assert!(matches!(
            next_key("z", 1),
            Err(LinkError::KeySpaceExhausted(_))
        ));
    }

    #[test]
    fn test_key_longer_than_limit_is_exhausted() {
        assert!(matches!(
            next_key("000", 2),
            Err(LinkError::KeySpaceExhausted(_))
        ));
    }

    #[test]
    fn test_zero_length_limit_produces_nothing() {
        assert!(matches!(next_key("", 0), Err(LinkError::KeySpaceExhausted(_))));
    }

    #[test]
    fn test_invalid_symbol_rejected() {
        assert!(matches!(next_key("aB", 3), Err(LinkError::InvalidKey(_))));
        assert!(matches!(next_key("a-", 3), Err(LinkError::InvalidKey(_))));
    }

    #[test]
    fn test_full_key_space_is_strictly_increasing() {
        let generator = KeyGenerator::new(2);
        let mut keys = Vec::new();
        let mut last = String::new();

        loop {
            match generator.generate(&last) {
                Ok(key) => {
                    keys.push(key.clone());
                    last = key;
                }
                Err(LinkError::KeySpaceExhausted(_)) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(keys.len() as u64, generator.capacity());
        assert_eq!(keys.len(), 36 + 36 * 36);
        assert_eq!(keys.last().map(String::as_str), Some("zz"));

        for pair in keys.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                (a.len(), a.as_str()) < (b.len(), b.as_str()),
                "{a} should sort before {b}"
            );
            assert_eq!(key_ordinal(a).unwrap() + 1, key_ordinal(b).unwrap());
        }
    }

    #[test]
    fn test_generate_batch_threads_keys() {
        let generator = KeyGenerator::new(3);
        let urls = vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
            "https://c.example".to_string(),
        ];

        let batch = generator.generate_batch("y", &urls).unwrap();
        let keys: Vec<&str> = batch.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "00", "01"]);
        assert_eq!(batch[1].1, "https://b.example");
    }

    #[test]
    fn test_generate_batch_is_atomic() {
        let generator = KeyGenerator::new(1);
        let urls = vec!["u1".to_string(), "u2".to_string()];

        // "y" -> "z" fits, the second key does not
        let result = generator.generate_batch("y", &urls);
        assert!(matches!(result, Err(LinkError::KeySpaceExhausted(_))));
    }

    #[test]
    fn test_key_ordinal() {
        assert_eq!(key_ordinal(""), Some(0));
        assert_eq!(key_ordinal("0"), Some(1));
        assert_eq!(key_ordinal("z"), Some(36));
        assert_eq!(key_ordinal("00"), Some(37));
        assert_eq!(key_ordinal("A"), None);
    }

    #[test]
    fn test_capacity_saturates() {
        assert_eq!(KeyGenerator::new(1).capacity(), 36);
        assert_eq!(KeyGenerator::new(64).capacity(), u64::MAX);
        // 超出 u32 的长度不会被截断成小值
        assert_eq!(KeyGenerator::new(usize::MAX).capacity(), u64::MAX);
    }
}
