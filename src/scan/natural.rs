use std::cmp::Ordering;

/// One run of a file name: either consecutive ASCII digits or everything between them
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Lowercased non-digit run
    Text(String),
    /// Digit run with leading zeros stripped, so numeric order is (length, bytes)
    Number(String),
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Number(a), Segment::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key that orders `img2` before `img10`.
///
/// The name is split into alternating non-digit and digit runs. Digit runs
/// compare as integers of any length, text runs compare case-insensitively.
/// Names whose runs are all equal (`img01` vs `img1`, `A` vs `a`) are ordered
/// by their raw bytes so the ordering stays total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalKey {
    segments: Vec<Segment>,
    raw: String,
}

impl NaturalKey {
    pub fn new(name: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        for c in name.chars() {
            let is_digit = c.is_ascii_digit();
            if is_digit != in_digits && !(current.is_empty() && segments.is_empty()) {
                segments.push(Self::segment(std::mem::take(&mut current), in_digits));
            }
            in_digits = is_digit;
            current.push(c);
        }
        if !current.is_empty() {
            segments.push(Self::segment(current, in_digits));
        }

        Self {
            segments,
            raw: name.to_string(),
        }
    }

    fn segment(run: String, digits: bool) -> Segment {
        if digits {
            let trimmed = run.trim_start_matches('0');
            Segment::Number(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
        } else {
            Segment::Text(run.to_lowercase())
        }
    }

    /// The name this key was built from
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments
            .cmp(&other.segments)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut keys: Vec<NaturalKey> = names.iter().map(|n| NaturalKey::new(n)).collect();
        keys.sort();
        keys.iter().map(|k| k.as_str().to_string()).collect()
    }

    #[test]
    fn test_digit_runs_compare_numerically() {
        assert_eq!(
            sorted(&["img2.jpg", "img10.jpg", "img1.jpg"]),
            vec!["img1.jpg", "img2.jpg", "img10.jpg"]
        );
    }

    #[test]
    fn test_text_runs_ignore_case() {
        assert_eq!(
            sorted(&["b1.png", "A2.png", "a1.png"]),
            vec!["a1.png", "A2.png", "b1.png"]
        );
    }

    #[test]
    fn test_multiple_numeric_runs() {
        assert_eq!(
            sorted(&["shot2_frame10.jpg", "shot10_frame1.jpg", "shot2_frame9.jpg"]),
            vec!["shot2_frame9.jpg", "shot2_frame10.jpg", "shot10_frame1.jpg"]
        );
    }

    #[test]
    fn test_leading_zeros_and_huge_numbers() {
        assert_eq!(
            sorted(&["f000010.jpg", "f9.jpg", "f99999999999999999999999.jpg"]),
            vec!["f9.jpg", "f000010.jpg", "f99999999999999999999999.jpg"]
        );
        // Numerically equal names still get a deterministic order
        assert_eq!(sorted(&["f1.jpg", "f01.jpg"]), vec!["f01.jpg", "f1.jpg"]);
    }

    #[test]
    fn test_name_starting_with_digits() {
        assert_eq!(sorted(&["10.bmp", "9.bmp", "a.bmp"]), vec!["9.bmp", "10.bmp", "a.bmp"]);
    }

    #[test]
    fn test_leading_text_run_is_split_from_digits() {
        let key = NaturalKey::new("img12.jpg");
        assert_eq!(
            key.segments,
            vec![
                Segment::Text("img".to_string()),
                Segment::Number("12".to_string()),
                Segment::Text(".jpg".to_string()),
            ]
        );
    }
}
