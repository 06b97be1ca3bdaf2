// ── Token ─────────────────────────────────────────────────────────────────

/// One whitespace-separated word of a scene-file line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    pub text: &'s str,
    /// 1-based column (in characters) of the first character.
    pub col: usize,
}

impl<'s> Token<'s> {
    /// The token folded to ASCII lowercase, for case-insensitive keyword matching.
    ///
    /// Folding is ASCII-only and locale-independent; non-ASCII characters are kept.
    pub fn keyword(&self) -> String {
        self.text.to_ascii_lowercase()
    }

    /// Case-insensitive comparison against an ASCII keyword.
    #[inline]
    pub fn is(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }

    /// True for `#`-prefixed comment markers.
    #[inline]
    pub fn is_comment(&self) -> bool {
        self.text.starts_with('#')
    }
}

// ── Tokenizer ─────────────────────────────────────────────────────────────

/// Splits `line` on ASCII whitespace, keeping each word's column.
pub fn tokenize_line(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<(usize, usize)> = None; // (byte offset, column)

    for (col0, (byte, ch)) in line.char_indices().enumerate() {
        if ch.is_ascii_whitespace() {
            if let Some((from, col)) = start.take() {
                tokens.push(Token { text: &line[from..byte], col });
            }
        } else if start.is_none() {
            start = Some((byte, col0 + 1));
        }
    }
    if let Some((from, col)) = start {
        tokens.push(Token { text: &line[from..], col });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<&str> {
        tokenize_line(line).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_on_runs_of_whitespace() {
        assert_eq!(texts("  position =\t1  2 3 "), vec!["position", "=", "1", "2", "3"]);
    }

    #[test]
    fn empty_and_blank_lines_have_no_tokens() {
        assert!(tokenize_line("").is_empty());
        assert!(tokenize_line(" \t \r").is_empty());
    }

    #[test]
    fn columns_are_one_based_characters() {
        let tokens = tokenize_line("é = 1");
        assert_eq!(tokens[0].col, 1);
        assert_eq!(tokens[1].col, 3);
        assert_eq!(tokens[2].col, 5);
    }

    #[test]
    fn keyword_folds_ascii_only() {
        let tokens = tokenize_line("CoLoR Ä");
        assert_eq!(tokens[0].keyword(), "color");
        assert!(tokens[0].is("color"));
        assert_eq!(tokens[1].keyword(), "Ä");
    }
}
