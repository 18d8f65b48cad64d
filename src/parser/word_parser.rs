//! Word Parsing
//!
//! Quoting and parameter expansion inside words. These run as part of the
//! scanner: each function is entered just after its opening character has
//! been read and returns the finished part.

use crate::ast::types::{Lit, ParamExp, ParamOp, Position, QuoteKind, Word, WordPart, AST};
use crate::parser::lexer::{Scanner, WordBuilder};
use crate::parser::parser_substitution::dparen_is_subshell;
use crate::parser::types::ParseError;

/// Characters that name a special parameter
pub(crate) fn is_special_param(c: char) -> bool {
    matches!(c, '@' | '*' | '#' | '?' | '-' | '$' | '!' | '0')
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Escapable characters after `\` inside double quotes
const DQUOTE_ESCAPES: &str = "$`\"\\";

impl<'a> Scanner<'a> {
    /// `'...'`: every character up to the next `'` is literal.
    pub(crate) fn scan_single_quote(&mut self, open: Position) -> Result<WordPart, ParseError> {
        let inner = self.pos();
        let mut value = String::new();
        let close = loop {
            let at = self.pos();
            match self.read() {
                Some('\'') => break at,
                Some(c) => value.push(c),
                None => {
                    return Err(ParseError::unterminated(
                        self.name(),
                        open,
                        "reached EOF while parsing single-quotes",
                    ))
                }
            }
        };
        Ok(AST::quoted(open, QuoteKind::Single, AST::lit_word(inner, value), close))
    }

    /// `"..."`: only `$`, backticks and a few escapes keep their meaning.
    pub(crate) fn scan_double_quote(&mut self, open: Position) -> Result<WordPart, ParseError> {
        self.descend(open)?;
        let part = self.scan_double_quote_body(open);
        self.ascend();
        part
    }

    fn scan_double_quote_body(&mut self, open: Position) -> Result<WordPart, ParseError> {
        let unterminated = |name: &str| {
            ParseError::unterminated(name, open, "reached EOF while parsing double-quotes")
        };
        let mut wb = WordBuilder::new(self.pos());
        let close = loop {
            let at = self.pos();
            match self.read() {
                None => return Err(unterminated(self.name())),
                Some('"') => break at,
                Some('\\') => {
                    if !self.scan_quoted_escape(&mut wb, at, DQUOTE_ESCAPES) {
                        return Err(unterminated(self.name()));
                    }
                }
                Some('$') => self.scan_dollar(&mut wb, at, true)?,
                Some('`') => {
                    let part = self.scan_cmd_subst(at, true)?;
                    wb.push_part(part);
                }
                Some(c) => wb.push_char(c, at),
            }
        };
        Ok(AST::quoted(open, QuoteKind::Double, wb.finish(), close))
    }

    /// `\` in a quoted context: escapes only the characters in `special`,
    /// otherwise both characters are kept. Returns false at EOF.
    pub(crate) fn scan_quoted_escape(
        &mut self,
        wb: &mut WordBuilder,
        at: Position,
        special: &str,
    ) -> bool {
        let inner = self.pos();
        match self.read() {
            Some('\n') => {
                wb.flush();
                true
            }
            Some(c) if special.contains(c) => {
                let word = AST::lit_word(inner, c.to_string());
                wb.push_part(AST::quote(at, QuoteKind::Backslash, word));
                true
            }
            Some(c) => {
                wb.push_char('\\', at);
                wb.push_char(c, inner);
                true
            }
            None => false,
        }
    }

    /// After `$`: a parameter, a substitution, or a literal `$`.
    pub(crate) fn scan_dollar(
        &mut self,
        wb: &mut WordBuilder,
        dollar: Position,
        quoted: bool,
    ) -> Result<(), ParseError> {
        match self.peek() {
            Some('{') => {
                self.read();
                let part = self.scan_braced_param(dollar, quoted)?;
                wb.push_part(part);
            }
            Some('(') => {
                self.read();
                let part = if self.peek() == Some('(')
                    && !dparen_is_subshell(self.cursor().lookahead().skip(1))
                {
                    self.read();
                    self.scan_arith_exp(dollar)?
                } else {
                    self.scan_cmd_subst(dollar, false)?
                };
                wb.push_part(part);
            }
            Some(c) if c.is_ascii_digit() => {
                let pos = self.pos();
                let digits = self.read_while(|c| c.is_ascii_digit());
                wb.push_part(unbraced(dollar, AST::lit(pos, digits)));
            }
            Some(c) if is_special_param(c) => {
                let pos = self.pos();
                self.read();
                wb.push_part(unbraced(dollar, AST::lit(pos, c.to_string())));
            }
            Some(c) if is_name_start(c) => {
                let pos = self.pos();
                let name = self.read_while(is_name_char);
                wb.push_part(unbraced(dollar, AST::lit(pos, name)));
            }
            _ => wb.push_char('$', dollar),
        }
        Ok(())
    }

    fn read_while(&mut self, pred: fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.read();
            out.push(c);
        }
        out
    }

    // ===========================================================================
    // ${...}
    // ===========================================================================

    /// Whether the `#` under the cursor is a length prefix rather than the
    /// parameter `$#`.
    fn at_length_prefix(&self) -> bool {
        match self.cursor().peek_nth(1) {
            None | Some('}') => false,
            // ${##} is the length of $#, ${#-x} is $# with a default
            Some('#' | '?' | '-') => self.cursor().peek_nth(2) == Some('}'),
            Some(c) => is_special_param(c) || is_name_char(c),
        }
    }

    /// `${...}` counts against the nesting budget, since operands can hold
    /// further expansions and quotes.
    fn scan_braced_param(&mut self, dollar: Position, quoted: bool) -> Result<WordPart, ParseError> {
        self.descend(dollar)?;
        let part = self.scan_braced_param_body(dollar, quoted);
        self.ascend();
        part
    }

    fn scan_braced_param_body(&mut self, dollar: Position, quoted: bool) -> Result<WordPart, ParseError> {
        let unterminated = |name: &str| {
            ParseError::unterminated(name, dollar, "reached EOF while looking for matching '}'")
        };
        let invalid = |name: &str| ParseError::invalid(name, dollar, "invalid parameter expansion");

        let mut length_pos = None;
        if self.peek() == Some('#') && self.at_length_prefix() {
            length_pos = Some(self.pos());
            self.read();
        }

        let name_pos = self.pos();
        let name = match self.peek() {
            None => return Err(unterminated(self.name())),
            Some(c) if c.is_ascii_digit() => self.read_while(|c| c.is_ascii_digit()),
            Some(c) if is_special_param(c) => {
                self.read();
                c.to_string()
            }
            Some(c) if is_name_start(c) => self.read_while(is_name_char),
            Some(_) => return Err(invalid(self.name())),
        };
        let name = AST::lit(name_pos, name);

        let op_pos = self.pos();
        if let Some(length_pos) = length_pos {
            return match self.read() {
                Some('}') => Ok(braced(dollar, name, length_pos, ParamOp::Length, None, op_pos)),
                Some(_) => Err(invalid(self.name())),
                None => Err(unterminated(self.name())),
            };
        }

        let op = match self.read() {
            None => return Err(unterminated(self.name())),
            Some('}') => return Ok(braced(dollar, name, Position::default(), ParamOp::None, None, op_pos)),
            Some(':') => match self.read() {
                Some('-') => ParamOp::DefaultUnsetOrNull,
                Some('=') => ParamOp::AssignUnsetOrNull,
                Some('?') => ParamOp::ErrorUnsetOrNull,
                Some('+') => ParamOp::AlternateSetNotNull,
                None => return Err(unterminated(self.name())),
                Some(_) => return Err(invalid(self.name())),
            },
            Some('-') => ParamOp::DefaultUnset,
            Some('=') => ParamOp::AssignUnset,
            Some('?') => ParamOp::ErrorUnset,
            Some('+') => ParamOp::AlternateSet,
            Some('#') if self.peek() == Some('#') => {
                self.read();
                ParamOp::RemoveLargestPrefix
            }
            Some('#') => ParamOp::RemoveSmallestPrefix,
            Some('%') if self.peek() == Some('%') => {
                self.read();
                ParamOp::RemoveLargestSuffix
            }
            Some('%') => ParamOp::RemoveSmallestSuffix,
            Some(_) => return Err(invalid(self.name())),
        };

        let mut wb = WordBuilder::new(self.pos());
        let rbrace = loop {
            let at = self.pos();
            match self.read() {
                None => return Err(unterminated(self.name())),
                Some('}') => break at,
                Some('\\') => {
                    let escaped = if quoted {
                        self.scan_quoted_escape(&mut wb, at, "$`\"\\}")
                    } else {
                        self.scan_escape(&mut wb, at)
                    };
                    if !escaped {
                        return Err(unterminated(self.name()));
                    }
                }
                Some('$') => self.scan_dollar(&mut wb, at, quoted)?,
                Some('"') => {
                    let part = self.scan_double_quote(at)?;
                    wb.push_part(part);
                }
                Some('\'') if !quoted => {
                    let part = self.scan_single_quote(at)?;
                    wb.push_part(part);
                }
                Some('`') => {
                    let part = self.scan_cmd_subst(at, true)?;
                    wb.push_part(part);
                }
                Some(c) => wb.push_char(c, at),
            }
        };
        Ok(braced(dollar, name, op_pos, op, Some(wb.finish()), rbrace))
    }
}

fn unbraced(dollar: Position, name: Lit) -> WordPart {
    WordPart::ParamExp(ParamExp {
        dollar,
        braces: false,
        name,
        op_pos: Position::default(),
        op: ParamOp::None,
        word: None,
        rbrace: Position::default(),
    })
}

fn braced(
    dollar: Position,
    name: Lit,
    op_pos: Position,
    op: ParamOp,
    word: Option<Word>,
    rbrace: Position,
) -> WordPart {
    WordPart::ParamExp(ParamExp {
        dollar,
        braces: true,
        name,
        op_pos,
        op,
        word,
        rbrace,
    })
}
