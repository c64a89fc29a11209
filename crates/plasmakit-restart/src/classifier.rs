//! Line classification
//!
//! Recognizes the syntactic category of a single program line. Matching is
//! done on a lower-cased copy with all whitespace removed, so `G41.1 D1`,
//! `g41.1d1` and `G1X10Y10` classify the same way and words may appear in
//! any order. A line may carry several directives at once (a units word and
//! a motion word, say) and all of them are reported.
//!
//! Nothing is ever rejected here. Content that matches no known directive
//! becomes an inert [`LineClass::Directive`] with no directives.

use crate::expression::scan_value;
use crate::program::SourceLine;
use crate::state::{CutterCompensation, DistanceMode, MotionKind, PathBlend, SubroutineMarker};
use plasmakit_core::Units;
use serde::{Deserialize, Serialize};

/// Letters that address a machine axis
const AXIS_LETTERS: &str = "XYZABCUVW";

/// `o` word keywords that neither open nor close a block
const NEUTRAL_KEYWORDS: [&str; 6] = ["call", "return", "else", "elseif", "break", "continue"];

/// A single letter/value word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Upper-case word letter (or `$` for the spindle selector)
    pub letter: char,
    /// Value text as written
    pub value: String,
}

impl Word {
    /// Numeric code of a G or M word split into whole and decimal parts.
    ///
    /// `G01` gives `(1, None)` and `G41.1` gives `(41, Some(1))`.
    pub fn code(&self) -> Option<(u32, Option<u32>)> {
        let (major, minor) = match self.value.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (self.value.as_str(), None),
        };
        let major = major.parse::<u32>().ok()?;
        let minor = match minor {
            Some(minor) => {
                let minor = minor.trim_end_matches('0');
                if minor.is_empty() {
                    None
                } else {
                    Some(minor.parse::<u32>().ok()?)
                }
            }
            None => None,
        };
        Some((major, minor))
    }

    /// Value as a literal number
    pub fn number(&self) -> Option<f64> {
        self.value.parse::<f64>().ok()
    }

    /// Whether the word addresses an axis
    pub fn is_axis(&self) -> bool {
        AXIS_LETTERS.contains(self.letter)
    }

    fn is_command(&self) -> bool {
        self.letter == 'G' || self.letter == 'M'
    }
}

/// A recognized directive on a code line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    Units(Units),
    CutterCompensation(CutterCompensation),
    PathBlend(PathBlend),
    Distance(DistanceMode),
    ArcDistance(DistanceMode),
    Motion(MotionKind),
    /// Digital output 3 (`M62`-`M65 P3`)
    Torch { enabled: bool },
    /// Digital output 2 (`M62`-`M65 P2`)
    Thc { enabled: bool },
    /// `M67`/`M68 E3 Q<percent>`
    VelocityOverride { percent: Option<String> },
    /// `M190 P<id>`
    MaterialSelect { id: Option<String> },
    /// `M66 P3 ...`
    MaterialActivate,
    /// `M3`
    SpindleStart,
    /// `M5`
    SpindleStop,
    /// `F<value>`
    Feed(String),
    /// `o` word that neither opens nor closes a block (`call`, `return`, ...)
    BlockFlow(SubroutineMarker),
}

/// Words and directives found on a code line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeLine {
    pub words: Vec<Word>,
    pub directives: Vec<Directive>,
}

impl CodeLine {
    /// The explicit motion word on this line, if any
    pub fn motion(&self) -> Option<MotionKind> {
        self.directives.iter().find_map(|d| match d {
            Directive::Motion(kind) => Some(*kind),
            _ => None,
        })
    }

    /// Whether any axis word appears on the line
    pub fn has_axis_words(&self) -> bool {
        self.words.iter().any(Word::is_axis)
    }

    /// Whether the first word is an axis word (a modal continuation line)
    pub fn starts_with_axis_word(&self) -> bool {
        self.words.first().is_some_and(Word::is_axis)
    }
}

/// Classification of one program line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LineClass {
    /// Whole-line comment. `(o=...)` comments define an inline material.
    Comment { material_label: bool },
    /// `#...` assignment
    ParameterAssignment,
    SubroutineOpen(SubroutineMarker),
    SubroutineClose(SubroutineMarker),
    /// Line without motion; may carry zero or more directives
    Directive(CodeLine),
    /// Line with a motion word or axis words
    Motion(CodeLine),
}

impl LineClass {
    /// The code line carried by directive and motion lines
    pub fn code(&self) -> Option<&CodeLine> {
        match self {
            Self::Directive(code) | Self::Motion(code) => Some(code),
            _ => None,
        }
    }
}

/// Lower-case a line and drop all whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Classify a source line
pub fn classify(line: &SourceLine) -> LineClass {
    classify_text(&line.text)
}

/// Classify raw line text
pub fn classify_text(text: &str) -> LineClass {
    let normalized = normalize(text);

    if normalized.starts_with('(') || normalized.starts_with(';') {
        return LineClass::Comment {
            material_label: normalized.starts_with("(o="),
        };
    }
    if normalized.starts_with('#') {
        return LineClass::ParameterAssignment;
    }
    if let Some(marker) = parse_marker(&normalized) {
        if marker.keyword.starts_with("end") {
            return LineClass::SubroutineClose(marker);
        }
        if NEUTRAL_KEYWORDS.contains(&marker.keyword.as_str()) {
            return LineClass::Directive(CodeLine {
                words: Vec::new(),
                directives: vec![Directive::BlockFlow(marker)],
            });
        }
        return LineClass::SubroutineOpen(marker);
    }

    let words = scan_words(&normalized);
    let directives = directives_for(&words);
    let code = CodeLine { words, directives };
    if code.motion().is_some() || code.has_axis_words() {
        LineClass::Motion(code)
    } else {
        LineClass::Directive(code)
    }
}

/// Parse an `o` word marker from a normalized line
fn parse_marker(normalized: &str) -> Option<SubroutineMarker> {
    let rest = normalized.strip_prefix('o')?;
    let label_len = if rest.starts_with('<') {
        rest.find('>')? + 1
    } else {
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            return None;
        }
        digits
    };
    let label = format!("o{}", &rest[..label_len]);
    let keyword: String = rest[label_len..]
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    Some(SubroutineMarker { label, keyword })
}

/// Split a normalized line into words, skipping comments
fn scan_words(normalized: &str) -> Vec<Word> {
    let chars: Vec<char> = normalized.chars().collect();
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ';' => break,
            '(' => {
                while i < chars.len() && chars[i] != ')' {
                    i += 1;
                }
            }
            '[' | '<' => depth += 1,
            ']' | '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && (c.is_ascii_alphabetic() || c == '$') => {
                let (value, next) = scan_value(&chars, i + 1);
                if !value.is_empty() {
                    words.push(Word {
                        letter: c.to_ascii_uppercase(),
                        value,
                    });
                    i = next;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    words
}

/// Words that follow a G or M word up to the next G or M word
fn arguments(words: &[Word], index: usize) -> &[Word] {
    let rest = &words[index + 1..];
    let end = rest.iter().position(Word::is_command).unwrap_or(rest.len());
    &rest[..end]
}

fn argument<'a>(args: &'a [Word], letter: char) -> Option<&'a Word> {
    args.iter().find(|w| w.letter == letter)
}

fn argument_is(args: &[Word], letter: char, value: f64) -> bool {
    argument(args, letter)
        .and_then(Word::number)
        .is_some_and(|n| n == value)
}

/// Map a line's words onto directives
fn directives_for(words: &[Word]) -> Vec<Directive> {
    let mut directives = Vec::new();

    for (index, word) in words.iter().enumerate() {
        match word.letter {
            'G' => {
                let Some(code) = word.code() else { continue };
                let directive = match code {
                    (0, None) => Directive::Motion(MotionKind::Rapid),
                    (1, None) => Directive::Motion(MotionKind::Linear),
                    (2, None) => Directive::Motion(MotionKind::ArcCw),
                    (3, None) => Directive::Motion(MotionKind::ArcCcw),
                    (20, None) => Directive::Units(Units::Inch),
                    (21, None) => Directive::Units(Units::Millimetre),
                    (40, None) => Directive::CutterCompensation(CutterCompensation::Off),
                    (41, None) | (41, Some(1)) => {
                        Directive::CutterCompensation(CutterCompensation::Left)
                    }
                    (42, None) | (42, Some(1)) => {
                        Directive::CutterCompensation(CutterCompensation::Right)
                    }
                    (61, None) => Directive::PathBlend(PathBlend::ExactPath),
                    (61, Some(1)) => Directive::PathBlend(PathBlend::ExactStop),
                    (64, None) => {
                        let args = arguments(words, index);
                        Directive::PathBlend(PathBlend::Blend {
                            tolerance: argument(args, 'P').map(|w| w.value.clone()),
                            naive_cam: argument(args, 'Q').map(|w| w.value.clone()),
                        })
                    }
                    (90, None) => Directive::Distance(DistanceMode::Absolute),
                    (91, None) => Directive::Distance(DistanceMode::Incremental),
                    (90, Some(1)) => Directive::ArcDistance(DistanceMode::Absolute),
                    (91, Some(1)) => Directive::ArcDistance(DistanceMode::Incremental),
                    _ => continue,
                };
                directives.push(directive);
            }
            'M' => {
                let Some((code, None)) = word.code() else { continue };
                let args = arguments(words, index);
                let directive = match code {
                    3 => Directive::SpindleStart,
                    5 => Directive::SpindleStop,
                    62..=65 => {
                        let enabled = code == 63 || code == 65;
                        if argument_is(args, 'P', 3.0) {
                            Directive::Torch { enabled }
                        } else if argument_is(args, 'P', 2.0) {
                            Directive::Thc { enabled }
                        } else {
                            continue;
                        }
                    }
                    66 if argument_is(args, 'P', 3.0) => Directive::MaterialActivate,
                    67 | 68 if argument_is(args, 'E', 3.0) => Directive::VelocityOverride {
                        percent: argument(args, 'Q').map(|w| w.value.clone()),
                    },
                    190 => Directive::MaterialSelect {
                        id: argument(args, 'P').map(|w| w.value.clone()),
                    },
                    _ => continue,
                };
                directives.push(directive);
            }
            'F' => directives.push(Directive::Feed(word.value.clone())),
            _ => {}
        }
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directives(text: &str) -> Vec<Directive> {
        classify_text(text)
            .code()
            .map(|c| c.directives.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_comment_lines() {
        assert_eq!(
            classify_text("(G41 X10 comment)"),
            LineClass::Comment {
                material_label: false
            }
        );
        assert_eq!(
            classify_text("  ; G20"),
            LineClass::Comment {
                material_label: false
            }
        );
        assert_eq!(
            classify_text("(o=0, kw=0.9, ph=3.1)"),
            LineClass::Comment {
                material_label: true
            }
        );
    }

    #[test]
    fn test_parameter_assignment() {
        assert_eq!(
            classify_text("#<_hole_dia> = 10"),
            LineClass::ParameterAssignment
        );
        assert_eq!(classify_text("  #1=5"), LineClass::ParameterAssignment);
    }

    #[test]
    fn test_subroutine_markers() {
        assert_eq!(
            classify_text("O100 sub"),
            LineClass::SubroutineOpen(SubroutineMarker {
                label: "o100".to_string(),
                keyword: "sub".to_string(),
            })
        );
        assert_eq!(
            classify_text("o<cut_hole> endsub"),
            LineClass::SubroutineClose(SubroutineMarker {
                label: "o<cut_hole>".to_string(),
                keyword: "endsub".to_string(),
            })
        );
        assert!(matches!(
            classify_text("o100 if [#1 GT 2]"),
            LineClass::SubroutineOpen(_)
        ));
        assert!(matches!(
            directives("o100 call [1]").as_slice(),
            [Directive::BlockFlow(_)]
        ));
    }

    #[test]
    fn test_multiple_directives_on_one_line() {
        let found = directives("G21 G90 G1 X10 Y10 F1500");
        assert!(found.contains(&Directive::Units(Units::Millimetre)));
        assert!(found.contains(&Directive::Distance(DistanceMode::Absolute)));
        assert!(found.contains(&Directive::Motion(MotionKind::Linear)));
        assert!(found.contains(&Directive::Feed("1500".to_string())));
    }

    #[test]
    fn test_codes_without_spaces() {
        assert_eq!(
            directives("g41.1d1"),
            vec![Directive::CutterCompensation(CutterCompensation::Left)]
        );
        assert_eq!(
            directives("G42.1 D#<_kerf>"),
            vec![Directive::CutterCompensation(CutterCompensation::Right)]
        );
        assert_eq!(
            directives("g91.1"),
            vec![Directive::ArcDistance(DistanceMode::Incremental)]
        );
    }

    #[test]
    fn test_leading_zero_codes() {
        assert_eq!(
            directives("G00 X1"),
            vec![Directive::Motion(MotionKind::Rapid)]
        );
        assert_eq!(
            directives("G03 X1 Y1 I0 J1"),
            vec![Directive::Motion(MotionKind::ArcCcw)]
        );
        assert!(directives("G17").is_empty());
    }

    #[test]
    fn test_path_blend_tolerances() {
        assert_eq!(
            directives("g64p0.1q0.05"),
            vec![Directive::PathBlend(PathBlend::Blend {
                tolerance: Some("0.1".to_string()),
                naive_cam: Some("0.05".to_string()),
            })]
        );
        assert_eq!(
            directives("G61.1"),
            vec![Directive::PathBlend(PathBlend::ExactStop)]
        );
    }

    #[test]
    fn test_plasma_outputs() {
        assert_eq!(
            directives("M62 P3"),
            vec![Directive::Torch { enabled: false }]
        );
        assert_eq!(
            directives("m65p2"),
            vec![Directive::Thc { enabled: true }]
        );
        assert_eq!(
            directives("M67 E3 Q50"),
            vec![Directive::VelocityOverride {
                percent: Some("50".to_string())
            }]
        );
        assert!(directives("M62 P1").is_empty());
    }

    #[test]
    fn test_material_and_spindle() {
        assert_eq!(
            directives("M190 P5"),
            vec![Directive::MaterialSelect {
                id: Some("5".to_string())
            }]
        );
        assert_eq!(directives("M66 P3 L3 Q1"), vec![Directive::MaterialActivate]);
        assert_eq!(directives("M3 $0 S1"), vec![Directive::SpindleStart]);
        assert_eq!(directives("M5 $0"), vec![Directive::SpindleStop]);
    }

    #[test]
    fn test_motion_versus_directive() {
        assert!(matches!(classify_text("X10 Y20"), LineClass::Motion(_)));
        assert!(matches!(classify_text("G21"), LineClass::Directive(_)));
        assert!(matches!(classify_text(""), LineClass::Directive(_)));
        assert!(classify_text("X10 Y20").code().unwrap().starts_with_axis_word());
    }

    #[test]
    fn test_unrecognized_is_inert() {
        let class = classify_text("%");
        assert_eq!(class, LineClass::Directive(CodeLine::default()));
        let class = classify_text("T1 M6");
        assert!(class.code().unwrap().directives.is_empty());
    }

    #[test]
    fn test_inline_comment_words_ignored() {
        assert_eq!(
            directives("G0 X1 (G41 here)"),
            vec![Directive::Motion(MotionKind::Rapid)]
        );
    }

    #[test]
    fn test_feed_expression_word() {
        assert_eq!(
            directives("F#<_hal[plasmac.cut-feed-rate]>"),
            vec![Directive::Feed("#<_hal[plasmac.cut-feed-rate]>".to_string())]
        );
    }
}
