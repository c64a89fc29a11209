//! Word value extraction
//!
//! Pulls the textual value of a word (an axis coordinate, a P or Q argument)
//! out of a line without evaluating it. Values may be plain numbers,
//! parameter references (`#5420`, `#<_hal[...]>`) or bracketed expressions
//! (`[[#5420]+0.35]`), and are returned exactly as written so they can be
//! replayed into a synthesized program.

/// Characters that may form a value outside of brackets
const VALUE_CHARS: &str = "+-.0123456789#";

/// Scan one word value starting at `start`.
///
/// Leading whitespace is skipped. Inside `[...]` or `<...>` every character
/// is kept; outside them the scan stops at the first character that cannot
/// be part of a number or parameter reference. Comment delimiters always
/// stop the scan. Returns the value text and the index where scanning
/// stopped.
pub fn scan_value(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }

    let mut depth = 0usize;
    let mut value = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c == '(' || c == ';' {
            break;
        }
        if c == '[' || c == '<' {
            depth += 1;
            value.push(c);
        } else if (c == ']' || c == '>') && depth > 0 {
            depth -= 1;
            value.push(c);
        } else if depth > 0 || VALUE_CHARS.contains(c) {
            value.push(c);
        } else {
            break;
        }
        i += 1;
    }
    (value, i)
}

/// Extract the value of `axis` from a line.
///
/// Returns the first non-empty value written after the axis letter at
/// bracket depth zero, skipping comments. Letters inside parameter names
/// and expressions never match.
pub fn extract_axis(line: &str, axis: char) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let axis = axis.to_ascii_lowercase();
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
            _ if depth == 0 && c.to_ascii_lowercase() == axis => {
                let (value, next) = scan_value(&chars, i + 1);
                if !value.is_empty() {
                    return Some(value);
                }
                i = next;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Whether a value is a runtime expression rather than a literal.
///
/// A sign in front of a parameter or bracket (`-#1`, `+[#2*2]`) still makes
/// an expression.
pub fn is_expression(value: &str) -> bool {
    let value = value.trim();
    let unsigned = value.trim_start_matches(['+', '-']);
    unsigned.starts_with('[') || unsigned.starts_with('#') || value.ends_with(']')
}

/// Format a literal with at most six decimals and no trailing zeros
pub fn format_number(value: f64) -> String {
    let text = format!("{:.6}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
