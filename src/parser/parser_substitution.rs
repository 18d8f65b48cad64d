//! Substitution Parsing
//!
//! Command substitution (`$(...)` and backticks) and arithmetic expansion
//! (`$((...))`). A command substitution runs a nested parser over the same
//! session, so positions in the nested tree are positions in the original
//! input and the parent resumes right after the closing delimiter.

use crate::ast::types::{ArithExp, CmdSubst, Position, Word, WordPart};
use crate::parser::lexer::{Scanner, TokenType, WordBuilder};
use crate::parser::parser::Parser;
use crate::parser::types::ParseError;
use log::trace;

/// Decide whether `((` starts two nested subshells rather than an
/// arithmetic expression. `rest` yields the characters after the `((`.
///
/// The heuristic: track paren depth (starting at 2). When the first `)`
/// brings the depth back to 1 and is not immediately followed by another
/// `)`, the inner parens were a subshell, as in `$((cmd) 2>/dev/null)`.
pub fn dparen_is_subshell(rest: impl Iterator<Item = char>) -> bool {
    let mut chars = rest.peekable();
    let mut depth: i32 = 2;
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    while let Some(c) = chars.next() {
        if in_single_quote {
            if c == '\'' {
                in_single_quote = false;
            }
            continue;
        }
        if in_double_quote {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_double_quote = false,
                _ => {}
            }
            continue;
        }

        match c {
            '\'' => in_single_quote = true,
            '"' => in_double_quote = true,
            '\\' => {
                chars.next();
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 1 {
                    // `))` is the end of the arithmetic expression
                    return chars.peek() != Some(&')');
                }
                if depth == 0 {
                    return false;
                }
            }
            _ => {}
        }
    }

    // Undecided at EOF: arithmetic
    false
}

impl<'a> Scanner<'a> {
    /// Parse the command list of a substitution opened at `left`. The
    /// opening delimiter has already been read.
    pub(crate) fn scan_cmd_subst(
        &mut self,
        left: Position,
        backquoted: bool,
    ) -> Result<WordPart, ParseError> {
        let closer = if backquoted {
            TokenType::BackQuote
        } else {
            TokenType::RParen
        };
        self.descend(left)?;
        trace!("command substitution at {} ({})", left, closer.as_str());

        let aliases = self.aliases();
        let mut nested = Parser::nested(self.session(), aliases, backquoted);
        let result = nested.parse_subst(closer);
        let nested_depth = nested.scanner_mut().depth();
        let comments = nested.scanner_mut().take_comments();
        let heredocs = std::mem::take(nested.scanner_mut().pending_heredocs());
        drop(nested);

        self.ascend();
        self.adopt_comments(comments);
        // bodies of here-documents opened inside the substitution follow
        // the line it ends on
        self.pending_heredocs().extend(heredocs);

        let (commands, right) = match result {
            Ok(done) => done,
            Err(err) if err.is_unexpected_eof() => {
                let message = format!("reached EOF while looking for matching '{}'", closer.as_str());
                return Err(ParseError::unterminated(self.name(), left, message));
            }
            Err(err) if backquoted && nested_depth == 0 && err.message.starts_with("unexpected '`'") => {
                return Err(ParseError::syntax(self.name(), err.pos, "unexpected '`'"));
            }
            Err(err) => return Err(err),
        };

        // right points just past the closing delimiter
        Ok(WordPart::CmdSubst(CmdSubst {
            dollar: !backquoted,
            left,
            right: right.shift(1),
            commands,
        }))
    }

    /// `$((`: both parens read.
    pub(crate) fn scan_arith_exp(&mut self, left: Position) -> Result<WordPart, ParseError> {
        let (expr, right) = self.scan_arith(left)?;
        Ok(WordPart::ArithExp(ArithExp { left, right, expr }))
    }

    /// Read the raw text of an arithmetic expression up to the `))` that
    /// balances the opening one. Quotes and substitutions inside are still
    /// parsed. Returns the expression and the position of the first `)`.
    pub(crate) fn scan_arith(&mut self, left: Position) -> Result<(Word, Position), ParseError> {
        self.descend(left)?;
        let arith = self.scan_arith_body(left);
        self.ascend();
        arith
    }

    fn scan_arith_body(&mut self, left: Position) -> Result<(Word, Position), ParseError> {
        let unterminated = |name: &str| {
            ParseError::unterminated(name, left, "reached EOF while looking for matching '))'")
        };
        let mut wb = WordBuilder::new(self.pos());
        let mut depth = 0usize;
        loop {
            let at = self.pos();
            match self.read() {
                None => return Err(unterminated(self.name())),
                Some('(') => {
                    depth += 1;
                    wb.push_char('(', at);
                }
                Some(')') if depth > 0 => {
                    depth -= 1;
                    wb.push_char(')', at);
                }
                Some(')') if self.peek() == Some(')') => {
                    self.read();
                    return Ok((wb.finish(), at));
                }
                Some('\\') => {
                    if !self.scan_escape(&mut wb, at) {
                        return Err(unterminated(self.name()));
                    }
                }
                Some('\'') => {
                    let part = self.scan_single_quote(at)?;
                    wb.push_part(part);
                }
                Some('"') => {
                    let part = self.scan_double_quote(at)?;
                    wb.push_part(part);
                }
                Some('$') => self.scan_dollar(&mut wb, at, false)?,
                Some('`') => {
                    let part = self.scan_cmd_subst(at, true)?;
                    wb.push_part(part);
                }
                Some(c) => wb.push_char(c, at),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{CmdExpr, Command};
    use crate::ast::Node;
    use crate::parser::lexer::Mode;
    use crate::parser::source::Session;
    use crate::parser::types::ErrorKind;

    fn is_subshell(src: &str) -> bool {
        dparen_is_subshell(src.chars())
    }

    fn word(src: &str) -> Word {
        let mut session = Session::new("t", src);
        let mut scanner = Scanner::new(&mut session, None);
        scanner.next_token(Mode::Argument).unwrap().word.unwrap()
    }

    fn error(src: &str) -> ParseError {
        let mut session = Session::new("t", src);
        let mut scanner = Scanner::new(&mut session, None);
        loop {
            match scanner.next_token(Mode::Argument) {
                Ok(tok) if tok.token_type == TokenType::Eof => panic!("no error for {:?}", src),
                Ok(_) => continue,
                Err(err) => return err,
            }
        }
    }

    fn subst(part: &WordPart) -> &CmdSubst {
        match part {
            WordPart::CmdSubst(cs) => cs,
            other => panic!("expected command substitution, got {:?}", other),
        }
    }

    #[test]
    fn test_dparen_arithmetic() {
        assert!(!is_subshell("1+2))"));
        assert!(!is_subshell("x+(y*2)))"));
        assert!(!is_subshell("1+2"));
    }

    #[test]
    fn test_dparen_subshell() {
        assert!(is_subshell("cmd) x)"));
        assert!(is_subshell("which cmd) 2>/dev/null)"));
        assert!(is_subshell("a) | (b))"));
        assert!(!is_subshell("a || b))"));
        assert!(is_subshell("echo ')') x)"));
    }

    #[test]
    fn test_dollar_paren() {
        let w = word("$(echo hi)");
        let cs = subst(&w.parts[0]);
        assert!(cs.dollar);
        assert_eq!(cs.left, Position::new(1, 1));
        assert_eq!(cs.right, Position::new(1, 11));
        assert_eq!(cs.commands.len(), 1);
    }

    #[test]
    fn test_backquote() {
        let w = word("`echo hi`x");
        let cs = subst(&w.parts[0]);
        assert!(!cs.dollar);
        assert_eq!(cs.right, Position::new(1, 10));
        assert!(matches!(&w.parts[1], WordPart::Lit(l) if l.value == "x"));
    }

    #[test]
    fn test_nested_positions_preserved() {
        let mut session = Session::new("t", "echo $(basename $(dirname $0)).");
        let mut scanner = Scanner::new(&mut session, None);
        scanner.next_token(Mode::Command).unwrap();
        let w = scanner.next_token(Mode::Argument).unwrap().word.unwrap();

        let outer = subst(&w.parts[0]);
        assert_eq!(outer.right, Position::new(1, 31));
        let Command::Cmd(cmd) = &outer.commands[0] else {
            panic!("expected a simple command");
        };
        let CmdExpr::Simple(simple) = &cmd.expr else {
            panic!("expected a simple command");
        };
        let inner = subst(&simple.args[1].parts[0]);
        assert_eq!(inner.left, Position::new(1, 17));
        assert_eq!(inner.right, Position::new(1, 30));
        assert_eq!(WordPart::CmdSubst(inner.clone()).end(), Position::new(1, 30));
        match &w.parts[1] {
            WordPart::Lit(lit) => {
                assert_eq!(lit.value, ".");
                assert_eq!(lit.pos, Position::new(1, 31));
            }
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn test_subst_with_case_parens() {
        let w = word("$(case x in a) echo;; esac)");
        let cs = subst(&w.parts[0]);
        assert_eq!(cs.commands.len(), 1);
        assert_eq!(cs.right, Position::new(1, 28));
    }

    #[test]
    fn test_arith_expansion() {
        let w = word("$((1 + (2 * x)))");
        match &w.parts[0] {
            WordPart::ArithExp(ae) => {
                assert_eq!(ae.expr.lit_value(), "1 + (2 * x)");
                assert_eq!(ae.right, Position::new(1, 15));
            }
            other => panic!("expected arithmetic, got {:?}", other),
        }
    }

    #[test]
    fn test_dollar_dparen_subshell() {
        let w = word("$((echo a) | cat)");
        let cs = subst(&w.parts[0]);
        assert_eq!(cs.commands.len(), 1);
    }

    #[test]
    fn test_unterminated_substitutions() {
        let err = error("echo $(ls");
        assert_eq!(err.kind, ErrorKind::Unterminated);
        assert_eq!(err.message, "reached EOF while looking for matching ')'");
        assert_eq!(err.pos, Position::new(1, 6));

        let err = error("`ls");
        assert_eq!(err.message, "reached EOF while looking for matching '`'");
        assert_eq!(err.pos, Position::new(1, 1));

        let err = error("$((1 + 2");
        assert_eq!(err.message, "reached EOF while looking for matching '))'");
        assert_eq!(err.pos, Position::new(1, 1));
    }

    #[test]
    fn test_backquote_unexpected_close() {
        let err = error("`echo |`");
        assert_eq!(err.message, "unexpected '`'");
        assert_eq!(err.pos, Position::new(1, 8));
    }
}
