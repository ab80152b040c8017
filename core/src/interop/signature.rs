//! Byte-pattern signatures
//!
//! Signatures are written the way disassemblers print them:
//! `"48 8D 05 ?? ?? ?? ??"`, where `??` (or `?`) matches any byte.

use std::fmt;
use std::str::FromStr;

use super::LocateError;

#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
    /// `true` where the byte must match, `false` for wildcards
    mask: Vec<bool>,
}

impl Signature {
    pub fn parse(text: &str) -> Result<Self, LocateError> {
        let mut bytes = Vec::new();
        let mut mask = Vec::new();

        for (position, token) in text.split_whitespace().enumerate() {
            if token.chars().all(|c| c == '?') && token.len() <= 2 {
                bytes.push(0);
                mask.push(false);
                continue;
            }
            let byte = (token.len() == 2)
                .then(|| u8::from_str_radix(token, 16).ok())
                .flatten()
                .ok_or_else(|| LocateError::MalformedSignature {
                    token: token.to_string(),
                    position,
                })?;
            bytes.push(byte);
            mask.push(true);
        }

        if bytes.is_empty() {
            return Err(LocateError::EmptySignature);
        }
        Ok(Self { bytes, mask })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset of the first match in `data`.
    pub fn find(&self, data: &[u8]) -> Option<usize> {
        self.find_iter(data).next()
    }

    /// Offsets of every match in `data`.
    ///
    /// Searches for the longest run of fixed bytes with memchr's SIMD finder,
    /// then verifies the wildcard positions around each hit.
    pub fn find_iter<'a>(&'a self, data: &'a [u8]) -> Box<dyn Iterator<Item = usize> + 'a> {
        let (anchor_offset, anchor) = self.anchor();

        if anchor.is_empty() {
            let last = data.len().checked_sub(self.len());
            return Box::new(
                last.into_iter()
                    .flat_map(|last| 0..=last)
                    .filter(move |&start| self.matches_at(data, start)),
            );
        }

        Box::new(memchr::memmem::find_iter(data, anchor).filter_map(move |hit| {
            let start = hit.checked_sub(anchor_offset)?;
            self.matches_at(data, start).then_some(start)
        }))
    }

    fn matches_at(&self, data: &[u8], start: usize) -> bool {
        let Some(window) = data.get(start..start + self.len()) else {
            return false;
        };
        window
            .iter()
            .zip(self.bytes.iter().zip(&self.mask))
            .all(|(actual, (expected, fixed))| !fixed || actual == expected)
    }

    /// Longest contiguous run of fixed bytes: `(offset, bytes)`.
    fn anchor(&self) -> (usize, &[u8]) {
        let mut best = (0, 0);
        let mut run_start = 0;

        for (i, &fixed) in self.mask.iter().enumerate() {
            if !fixed {
                run_start = i + 1;
                continue;
            }
            let run_len = i + 1 - run_start;
            if run_len > best.1 {
                best = (run_start, run_len);
            }
        }

        (best.0, &self.bytes[best.0..best.0 + best.1])
    }
}

impl FromStr for Signature {
    type Err = LocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(\"{self}\")")
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (byte, fixed)) in self.bytes.iter().zip(&self.mask).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if *fixed {
                write!(f, "{byte:02X}")?;
            } else {
                f.write_str("??")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bytes_and_wildcards() {
        let sig = Signature::parse("48 8D 05 ?? ? 0f").unwrap();
        assert_eq!(sig.len(), 6);
        assert_eq!(sig.to_string(), "48 8D 05 ?? ?? 0F");
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(
            Signature::parse("48 8G"),
            Err(LocateError::MalformedSignature { position: 1, .. })
        ));
        assert!(matches!(
            Signature::parse("488D"),
            Err(LocateError::MalformedSignature { position: 0, .. })
        ));
        assert!(matches!(Signature::parse("   "), Err(LocateError::EmptySignature)));
    }

    #[test]
    fn finds_pattern_with_wildcards() {
        let data = [0x90, 0x48, 0x8D, 0x05, 0x11, 0x22, 0x0F, 0x48, 0x8D, 0x05, 0x33, 0x44, 0x0F];
        let sig = Signature::parse("48 8D 05 ?? ?? 0F").unwrap();
        assert_eq!(sig.find(&data), Some(1));
        assert_eq!(sig.find_iter(&data).collect::<Vec<_>>(), vec![1, 7]);
    }

    #[test]
    fn leading_wildcards_do_not_underflow() {
        let data = [0xAA, 0xBB, 0xCC];
        let sig = Signature::parse("?? ?? AA").unwrap();
        assert_eq!(sig.find(&data), None);

        let sig = Signature::parse("?? BB").unwrap();
        assert_eq!(sig.find(&data), Some(0));
    }

    #[test]
    fn pattern_running_past_end_is_not_matched() {
        let data = [0x00, 0x0F, 0x11];
        let sig = Signature::parse("0F 11 48 10").unwrap();
        assert_eq!(sig.find(&data), None);
    }

    #[test]
    fn all_wildcard_signature_matches_every_window() {
        let data = [1, 2, 3];
        let sig = Signature::parse("?? ??").unwrap();
        assert_eq!(sig.find_iter(&data).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sig.find(&[1]), None);
    }

    #[test]
    fn anchor_hit_failing_verification_is_skipped() {
        // First "0F 11 48 10" is preceded by the wrong byte
        let data = [0x00, 0x0F, 0x11, 0x48, 0x10, 0xC3, 0x0F, 0x11, 0x48, 0x10];
        let sig = Signature::parse("C3 0F 11 48 10").unwrap();
        assert_eq!(sig.find(&data), Some(5));

        let mut hits = sig.find_iter(&data);
        assert_eq!(hits.next(), Some(5));
        assert_eq!(hits.next(), None);
    }
}
