//! HTS-style annotation parsing.
//!
//! One annotation line describes one phoneme segment: two integer time
//! boundaries (100 ns units) followed by a rigid, delimiter-driven context
//! grammar. The line must match the grammar byte-for-byte; anything else is
//! a parse error.
//!
//! Parsing produces a typed [`Segment`] record — a fixed-width vector of
//! tagged fields — so downstream code never re-interprets a raw string
//! array in place. Nine field slots carry categorical values (five
//! immediate-phoneme-context slots, one vowel, three grammatical-position,
//! one tone-and-break); the rest are numeric passthrough.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::{Error, Result};

/// Width of the parsed record, time boundaries included.
pub const RECORD_WIDTH: usize = 55;

/// The literal token marking an unknown / not-applicable field value.
pub const UNKNOWN_MARKER: &str = "x";

/// Capture slots (0-based) holding phoneme identities: the quinphone
/// context left-left, left, current, right, right-right.
const PHONEME_SLOTS: [usize; 5] = [2, 3, 4, 5, 6];

/// Vowel of the current syllable.
const VOWEL_SLOT: usize = 27;

/// Grammatical position of the previous, current and next word.
const GPOS_SLOTS: [usize; 3] = [31, 33, 41];

/// ToBI end tone of the current phrase.
const TOBI_SLOT: usize = 49;

/// One field of a parsed annotation record.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelField {
    Numeric(f64),
    Phoneme(String),
    Vowel(String),
    Gpos(String),
    Tobi(String),
}

/// One phoneme segment: absolute boundaries plus the full fixed-width
/// record (slots 0 and 1 duplicate the boundaries as numeric fields).
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: i64,
    pub end: i64,
    pub fields: Vec<LabelField>,
}

impl Segment {
    /// Segment length in annotation time units (100 ns).
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Frames this segment occupies on the 5 ms grid: the 100 ns duration
    /// converted to milliseconds and divided by the frame period, truncated
    /// toward zero. Sub-frame segments yield 0.
    pub fn frame_count(&self) -> usize {
        (self.duration() as f64 * 1e-4 / 5.0) as usize
    }
}

fn label_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        let mut pattern = String::from(r"^([0-9]+) ([0-9]+) ");
        // Quinphone context and position-in-syllable.
        pattern.push_str(r"(.+)\^(.+)-(.+)\+(.+)=(.+)@(.+)_(.+)");
        // Syllable context blocks.
        pattern.push_str(r"/A:(.+)_(.+)_(.+)");
        pattern.push_str(
            r"/B:(.+)-(.+)-(.+)@(.+)-(.+)&(.+)-(.+)#(.+)-(.+)\$(.+)-(.+)!(.+)-(.+);(.+)-(.+)\|(.+)",
        );
        pattern.push_str(r"/C:(.+)\+(.+)\+(.+)");
        // Word context blocks.
        pattern.push_str(r"/D:(.+)_(.+)");
        pattern.push_str(r"/E:(.+)\+(.+)@(.+)\+(.+)&(.+)\+(.+)#(.+)\+(.+)");
        pattern.push_str(r"/F:(.+)_(.+)");
        // Phrase and utterance context blocks.
        pattern.push_str(r"/G:(.+)_(.+)");
        pattern.push_str(r"/H:(.+)=(.+)@(.+)=(.+)\|(.+)");
        pattern.push_str(r"/I:(.+)=(.+)");
        pattern.push_str(r"/J:(.+)\+(.+)-(.+)$");
        Regex::new(&pattern).expect("annotation grammar is a valid regex")
    })
}

/// Parse one annotation line into a typed segment record.
pub fn parse_line(line: &str) -> Result<Segment> {
    let line = line.trim_end();
    let captures = match_grammar(line)?;

    let start = parse_boundary(captures[0])?;
    let end = parse_boundary(captures[1])?;

    let mut fields = Vec::with_capacity(RECORD_WIDTH);
    for (slot, value) in captures.iter().enumerate() {
        let field = if PHONEME_SLOTS.contains(&slot) {
            LabelField::Phoneme(value.to_string())
        } else if slot == VOWEL_SLOT {
            LabelField::Vowel(value.to_string())
        } else if GPOS_SLOTS.contains(&slot) {
            LabelField::Gpos(value.to_string())
        } else if slot == TOBI_SLOT {
            LabelField::Tobi(value.to_string())
        } else {
            LabelField::Numeric(parse_numeric(value)?)
        };
        fields.push(field);
    }

    Ok(Segment { start, end, fields })
}

/// Read a whole annotation file, one segment per non-empty line, in file
/// order.
pub fn read_label_file(path: impl AsRef<Path>) -> Result<Vec<Segment>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;

    let mut segments = Vec::new();
    for (line_number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let segment = parse_line(line).map_err(|e| match e {
            Error::Parse(msg) => {
                Error::Parse(format!("{}:{}: {msg}", path.display(), line_number + 1))
            }
            other => other,
        })?;
        segments.push(segment);
    }
    Ok(segments)
}

/// Match a line against the grammar, returning its 55 captured fields.
fn match_grammar(line: &str) -> Result<Vec<&str>> {
    let captures = label_grammar().captures(line).ok_or_else(|| {
        Error::Parse(format!(
            "annotation line does not match the grammar: {:?}",
            excerpt(line)
        ))
    })?;
    Ok((1..captures.len())
        .map(|i| captures.get(i).map(|m| m.as_str()).unwrap_or(""))
        .collect())
}

fn parse_boundary(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| Error::Parse(format!("invalid time boundary {value:?}")))
}

/// Numeric passthrough field; the unknown marker reads as 0.
fn parse_numeric(value: &str) -> Result<f64> {
    if value == UNKNOWN_MARKER {
        return Ok(0.0);
    }
    value
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("invalid numeric field {value:?}")))
}

fn excerpt(line: &str) -> String {
    line.chars().take(60).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a grammar-conforming line with the given boundaries, quinphone
    /// context, vowel, gpos triple and tobi value; every numeric slot gets
    /// a small distinct integer.
    pub(crate) fn sample_line(
        start: i64,
        end: i64,
        quinphone: [&str; 5],
        vowel: &str,
        gpos: [&str; 3],
        tobi: &str,
    ) -> String {
        let [ll, l, c, r, rr] = quinphone;
        let [gp_prev, gp_cur, gp_next] = gpos;
        format!(
            "{start} {end} {ll}^{l}-{c}+{r}={rr}@1_2\
             /A:1_2_3\
             /B:1-1-4@1-2&3-4#1-2$1-2!1-2;1-2|{vowel}\
             /C:1+1+3\
             /D:{gp_prev}_2\
             /E:{gp_cur}+2@3+4&5+6#7+8\
             /F:{gp_next}_2\
             /G:5_5\
             /H:4=3@1=2|{tobi}\
             /I:8=5\
             /J:10+9-2"
        )
    }

    #[test]
    fn parses_a_conforming_line() {
        let line = sample_line(0, 50000, ["sil", "sil", "k", "aa", "t"], "aa", ["0", "nn", "vb"], "L-L%");
        let segment = parse_line(&line).unwrap();
        assert_eq!(segment.start, 0);
        assert_eq!(segment.end, 50000);
        assert_eq!(segment.fields.len(), RECORD_WIDTH);
        assert_eq!(segment.fields[4], LabelField::Phoneme("k".into()));
        assert_eq!(segment.fields[27], LabelField::Vowel("aa".into()));
        assert_eq!(segment.fields[33], LabelField::Gpos("nn".into()));
        assert_eq!(segment.fields[49], LabelField::Tobi("L-L%".into()));
        assert_eq!(segment.fields[0], LabelField::Numeric(0.0));
        assert_eq!(segment.fields[1], LabelField::Numeric(50000.0));
    }

    #[test]
    fn unknown_marker_in_numeric_slot_reads_as_zero() {
        let line = sample_line(0, 50000, ["x", "x", "pau", "x", "x"], "x", ["x", "x", "x"], "x")
            .replace("/A:1_2_3", "/A:x_x_x");
        let segment = parse_line(&line).unwrap();
        assert_eq!(segment.fields[9], LabelField::Numeric(0.0));
        // Categorical slots keep the marker for the encoder to substitute.
        assert_eq!(segment.fields[2], LabelField::Phoneme("x".into()));
    }

    #[test]
    fn non_matching_line_is_a_parse_error() {
        for line in ["", "garbage", "0 50000 k", "0 50000 a^b-c+d=e@1_2/A:1_2"] {
            let err = parse_line(line).unwrap_err();
            assert!(matches!(err, Error::Parse(_)), "line {line:?} gave {err:?}");
        }
    }

    #[test]
    fn frame_count_truncates_toward_zero() {
        let line = |start, end| sample_line(start, end, ["a", "b", "c", "d", "e"], "a", ["g", "g", "g"], "t");
        // 5 ms on the 100 ns grid is 50_000 units — exactly one frame.
        assert_eq!(parse_line(&line(0, 50_000)).unwrap().frame_count(), 1);
        assert_eq!(parse_line(&line(50_000, 250_000)).unwrap().frame_count(), 4);
        // A sub-frame segment contributes nothing.
        assert_eq!(parse_line(&line(0, 30_000)).unwrap().frame_count(), 0);
        assert_eq!(parse_line(&line(0, 99_999)).unwrap().frame_count(), 1);
    }

    #[test]
    fn read_label_file_missing_is_a_missing_file_error() {
        let err = read_label_file("/nonexistent/utt.lab").unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)), "got {err:?}");
    }

    #[test]
    fn read_label_file_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utt.lab");
        let lines = [
            sample_line(0, 50_000, ["sil", "sil", "k", "aa", "t"], "x", ["x", "nn", "x"], "x"),
            sample_line(50_000, 250_000, ["sil", "k", "aa", "t", "sil"], "aa", ["x", "nn", "x"], "x"),
        ];
        std::fs::write(&path, lines.join("\n")).unwrap();

        let segments = read_label_file(&path).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end, 50_000);
        assert_eq!(segments[1].end, 250_000);
    }

    #[test]
    fn parse_error_carries_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utt.lab");
        std::fs::write(&path, "not an annotation line\n").unwrap();

        let err = read_label_file(&path).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("utt.lab:1"), "got {message}");
    }
}
