/// Split text into sentence-sized segments.
///
/// A segment ends after `.`, `!`, `?`, `;`, `…` or a line break. A `.` or `,`
/// between two digits is part of a number and never ends a segment. Runs of
/// whitespace collapse to a single space and empty segments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for (idx, ch) in text.char_indices() {
        if ch == '\n' || ch == '\r' {
            flush(&mut segments, &mut current);
            continue;
        }

        if ch.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
            continue;
        }

        current.push(ch);

        if is_terminator(ch) && !is_numeric_connector_between_digits(text, idx, ch) {
            flush(&mut segments, &mut current);
        }
    }

    flush(&mut segments, &mut current);
    segments
}

/// Collapse whitespace for single-shot synthesis.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn flush(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() && trimmed.chars().any(|c| !is_terminator(c)) {
        segments.push(trimmed.to_string());
    }
    current.clear();
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | ';' | '…')
}

fn is_numeric_connector_between_digits(text: &str, idx: usize, ch: char) -> bool {
    if ch != '.' {
        return false;
    }

    let prev = text[..idx].chars().next_back();
    let next = text[idx + ch.len_utf8()..].chars().next();

    matches!(
        (prev, next),
        (Some(left), Some(right)) if left.is_ascii_digit() && right.is_ascii_digit()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_sentence_terminators() {
        assert_eq!(
            split_sentences("Hello, world. Testing! Is it on? Yes; it is"),
            vec!["Hello, world.", "Testing!", "Is it on?", "Yes;", "it is"]
        );
    }

    #[test]
    fn keeps_decimals_inside_a_sentence() {
        assert_eq!(
            split_sentences("Version 2.0 reached 1,000 users. Nice."),
            vec!["Version 2.0 reached 1,000 users.", "Nice."]
        );
    }

    #[test]
    fn line_breaks_end_segments_and_whitespace_collapses() {
        assert_eq!(
            split_sentences("  first   line\n\nsecond\tline  "),
            vec!["first line", "second line"]
        );
    }

    #[test]
    fn drops_punctuation_only_segments() {
        assert_eq!(split_sentences("Wait... what?!"), vec!["Wait.", "what?"]);
        assert!(split_sentences("   ").is_empty());
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  a \n b\t c "), "a b c");
    }
}
