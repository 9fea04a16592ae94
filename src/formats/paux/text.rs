//! Tokenizing and lenient number parsing for sidecar values

/// Splits a value on whitespace, honouring double-quoted strings.
///
/// Quotes are stripped from the returned tokens and `\"` / `\\` escapes
/// inside quotes are resolved. Empty tokens are never produced, except for
/// an explicitly quoted empty string.
pub fn tokenize(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => in_quotes = false,
                '\\' if matches!(chars.peek(), Some('"') | Some('\\')) => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                _ => current.push(c),
            }
        } else if c == '"' {
            in_quotes = true;
            in_token = true;
        } else if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
        } else {
            current.push(c);
            in_token = true;
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}

/// Length of the longest prefix of `s` that looks like a decimal number
fn numeric_prefix_len(s: &str, allow_fraction: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut saw_digits = i > digits_start;

    if !allow_fraction {
        return if saw_digits { i } else { 0 };
    }

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        saw_digits |= i > frac_start;
    }

    if !saw_digits {
        return 0;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}

/// Parses a float the way C's `atof` does: leading whitespace is skipped,
/// trailing garbage ignored, and anything unparseable yields 0.0.
pub fn parse_f64(value: &str) -> f64 {
    let trimmed = value.trim_start();
    if let Ok(v) = trimmed.trim_end().parse::<f64>() {
        return v;
    }
    let len = numeric_prefix_len(trimmed, true);
    trimmed[..len].parse().unwrap_or(0.0)
}

/// Parses a leading signed integer, `atoi` style.
///
/// Returns `None` when there are no digits at all or the value does not fit.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let len = numeric_prefix_len(trimmed, false);
    if len == 0 {
        return None;
    }
    trimmed[..len].parse().ok()
}

/// Parses a leading unsigned decimal integer
pub fn parse_u64(value: &str) -> Option<u64> {
    let trimmed = value.trim_start();
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    trimmed[..digits].parse().ok()
}

/// Case-insensitive ASCII prefix test
pub fn starts_with_ci(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain() {
        assert_eq!(tokenize(" 10  20 3 "), vec!["10", "20", "3"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_tokenize_quoted() {
        assert_eq!(
            tokenize(r#"30 40 300 400 5 "id2" "a note""#),
            vec!["30", "40", "300", "400", "5", "id2", "a note"]
        );
        assert_eq!(tokenize(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(tokenize(r#"a """#), vec!["a", ""]);
    }

    #[test]
    fn test_parse_f64_lenient() {
        assert_eq!(parse_f64("  100.5"), 100.5);
        assert_eq!(parse_f64("-1e8"), -1.0e8);
        assert_eq!(parse_f64("12abc"), 12.0);
        assert_eq!(parse_f64("2.5e"), 2.5);
        assert_eq!(parse_f64("abc"), 0.0);
        assert_eq!(parse_f64(""), 0.0);
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse_i64(" 42"), Some(42));
        assert_eq!(parse_i64("-7px"), Some(-7));
        assert_eq!(parse_i64("x"), None);
        assert_eq!(parse_u64("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_u64("-1"), None);
    }

    #[test]
    fn test_starts_with_ci() {
        assert!(starts_with_ci("auxilarytarget: a.raw", "AuxilaryTarget"));
        assert!(!starts_with_ci("Aux", "AuxilaryTarget"));
    }
}
