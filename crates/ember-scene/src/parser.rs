use crate::error::ParseError;
use crate::lexer::{Token, tokenize_line};
use crate::light::LightSource;

// ── Line parser ───────────────────────────────────────────────────────────

/// Cursor over the tokens of one line.
struct LineParser<'s> {
    tokens: Vec<Token<'s>>,
    pos: usize,
    line: usize,
    /// Column just past the last character, used for "missing" errors.
    end_col: usize,
}

impl<'s> LineParser<'s> {
    fn new(line: usize, text: &'s str) -> Self {
        Self {
            tokens: tokenize_line(text),
            pos: 0,
            line,
            end_col: text.chars().count() + 1,
        }
    }

    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token<'s>> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn err_at(&self, col: usize, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.line, col)
    }

    fn err_here(&self, msg: impl Into<String>) -> ParseError {
        let col = self.peek().map_or(self.end_col, |t| t.col);
        self.err_at(col, msg)
    }

    fn expect_equals(&mut self, keyword: &str) -> Result<(), ParseError> {
        match self.advance() {
            Some(t) if t.text == "=" => Ok(()),
            Some(t) => Err(self.err_at(t.col, format!("expected `=` after `{keyword}`, found `{}`", t.text))),
            None => Err(self.err_at(self.end_col, format!("expected `=` after `{keyword}`"))),
        }
    }

    fn expect_number(&mut self, keyword: &str) -> Result<f32, ParseError> {
        let Some(tok) = self.advance() else {
            return Err(self.err_at(self.end_col, format!("missing component for `{keyword}`")));
        };
        match tok.text.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(self.err_at(tok.col, format!("expected a number, found `{}`", tok.text))),
        }
    }

    fn expect_vec3(&mut self, keyword: &str) -> Result<[f32; 3], ParseError> {
        Ok([
            self.expect_number(keyword)?,
            self.expect_number(keyword)?,
            self.expect_number(keyword)?,
        ])
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(self.err_at(t.col, format!("unexpected trailing token `{}`", t.text))),
        }
    }

    // ── Statements ────────────────────────────────────────────────────────

    /// Applies one line to `light`. Blank and comment lines are no-ops.
    fn parse_into(&mut self, light: &mut LightSource) -> Result<(), ParseError> {
        let Some(head) = self.advance() else {
            return Ok(());
        };
        if head.is_comment() {
            return Ok(());
        }

        match head.keyword().as_str() {
            "position" => {
                self.expect_equals("position")?;
                let [x, y, z] = self.expect_vec3("position")?;
                let w = match self.peek() {
                    Some(_) => self.expect_number("position")?,
                    None => 1.0,
                };
                light.position = [x, y, z, w];
            }
            "color" => {
                self.expect_equals("color")?;
                light.color = self.expect_vec3("color")?;
            }
            "coefficients" => {
                self.expect_equals("coefficients")?;
                light.coefficients = self.expect_vec3("coefficients")?;
            }
            _ => return Err(self.err_at(head.col, format!("unknown token `{}`", head.text))),
        }

        self.expect_end()
    }
}

// ── Public API ────────────────────────────────────────────────────────────

/// Parses one light block.
///
/// Starts from `LightSource::default()`; later lines overwrite earlier ones.
pub fn parse_light(src: &str) -> Result<LightSource, ParseError> {
    let mut light = LightSource::default();
    for (index, text) in src.lines().enumerate() {
        LineParser::new(index + 1, text).parse_into(&mut light)?;
    }
    Ok(light)
}

/// Lights accumulated from one or more `load` calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSet {
    lights: Vec<LightSource>,
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `src` as one light and appends it.
    ///
    /// On error nothing is appended.
    pub fn load(&mut self, src: &str) -> Result<&LightSource, ParseError> {
        let light = parse_light(src)?;
        self.lights.push(light);
        Ok(&self.lights[self.lights.len() - 1])
    }

    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}
