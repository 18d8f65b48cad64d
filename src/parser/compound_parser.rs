//! Compound Command Parser
//!
//! Handles parsing of compound commands: if, for, while, until, case,
//! subshell, group and arithmetic evaluation. Each construct tells the
//! scanner which closer it is waiting for while its body is read.

use crate::ast::types::{
    ArithEval, CaseClause, CaseItem, Cmd, CmdExpr, ElifClause, ElsePart, ElseClause, ForClause,
    Group, IfClause, Position, Subshell, UntilClause, WhileClause, Word, AST,
};
use crate::parser::lexer::{is_valid_name, Mode, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::ParseError;

impl<'a> Parser<'a> {
    /// A compound command and the redirections after it.
    pub(crate) fn compound_command(&mut self) -> Result<Cmd, ParseError> {
        let expr = match self.peek_type(Mode::Command)? {
            TokenType::LParen => self.parse_subshell()?,
            TokenType::LBrace => self.parse_group()?,
            TokenType::ArithCmd => self.parse_arith_eval()?,
            TokenType::If => self.parse_if()?,
            TokenType::For => self.parse_for()?,
            TokenType::While => self.parse_while()?,
            TokenType::Until => self.parse_until()?,
            TokenType::Case => self.parse_case()?,
            _ => return self.unexpected_next(Mode::Command, &[]),
        };
        let redirs = self.trailing_redirections()?;
        Ok(Cmd { expr, redirs })
    }

    /// Consume the opening token of a construct closed by `closer`.
    fn open(&mut self, closer: TokenType) -> Result<Position, ParseError> {
        let pos = self.next(Mode::Command)?.pos;
        self.scanner.enter(closer, pos)?;
        Ok(pos)
    }

    /// Consume `closer` and leave the construct it closes.
    fn close(&mut self, closer: TokenType) -> Result<Position, ParseError> {
        let pos = self.expect(closer, Mode::Command)?;
        self.scanner.leave();
        Ok(pos)
    }

    fn parse_subshell(&mut self) -> Result<CmdExpr, ParseError> {
        let lparen = self.open(TokenType::RParen)?;
        let list = self.compound_list()?;
        let rparen = self.close(TokenType::RParen)?;
        Ok(CmdExpr::Subshell(Subshell {
            lparen,
            rparen,
            list: Box::new(list),
        }))
    }

    fn parse_group(&mut self) -> Result<CmdExpr, ParseError> {
        let lbrace = self.open(TokenType::RBrace)?;
        let list = self.compound_list()?;
        let rbrace = self.close(TokenType::RBrace)?;
        Ok(CmdExpr::Group(Group {
            lbrace,
            rbrace,
            list: Box::new(list),
        }))
    }

    fn parse_arith_eval(&mut self) -> Result<CmdExpr, ParseError> {
        let token = self.next(Mode::Command)?;
        Ok(CmdExpr::ArithEval(ArithEval {
            left: token.pos,
            right: token.end,
            expr: token.word.unwrap_or_default(),
        }))
    }

    // ===========================================================================
    // IF
    // ===========================================================================

    fn parse_if(&mut self) -> Result<CmdExpr, ParseError> {
        let if_pos = self.open(TokenType::Fi)?;
        let cond = self.compound_list()?;
        let then_pos = self.expect(TokenType::Then, Mode::Command)?;
        let body = self.compound_list()?;

        let mut else_parts = Vec::new();
        let fi_pos = loop {
            let token = self.next(Mode::Command)?;
            match token.token_type {
                TokenType::Elif => {
                    let cond = self.compound_list()?;
                    let then_pos = self.expect(TokenType::Then, Mode::Command)?;
                    let body = self.compound_list()?;
                    else_parts.push(ElsePart::Elif(ElifClause {
                        elif_pos: token.pos,
                        cond: Box::new(cond),
                        then_pos,
                        body: Box::new(body),
                    }));
                }
                TokenType::Else => {
                    let body = self.compound_list()?;
                    else_parts.push(ElsePart::Else(ElseClause {
                        else_pos: token.pos,
                        body: Box::new(body),
                    }));
                    break self.expect(TokenType::Fi, Mode::Command)?;
                }
                TokenType::Fi => break token.pos,
                _ => {
                    return self.unexpected(
                        &token,
                        &[TokenType::Fi, TokenType::Elif, TokenType::Else],
                    )
                }
            }
        };
        self.scanner.leave();

        Ok(CmdExpr::If(IfClause {
            if_pos,
            cond: Box::new(cond),
            then_pos,
            body: Box::new(body),
            else_parts,
            fi_pos,
        }))
    }

    // ===========================================================================
    // LOOPS
    // ===========================================================================

    fn parse_for(&mut self) -> Result<CmdExpr, ParseError> {
        let for_pos = self.open(TokenType::Done)?;

        let token = self.next(Mode::Argument)?;
        let name = match token.word.as_ref().and_then(|w| w.as_lit()) {
            Some(name) if token.token_type == TokenType::Word && is_valid_name(name) => {
                AST::lit(token.pos, name)
            }
            _ if token.token_type == TokenType::Word => {
                return Err(ParseError::invalid(
                    self.name(),
                    token.pos,
                    "invalid for loop variable",
                ))
            }
            _ => return self.unexpected(&token, &[TokenType::Word]),
        };

        self.linebreak(Mode::Argument)?;
        let mut items = None;
        if self.peek(Mode::Argument)?.is_lit("in") {
            self.next(Mode::Argument)?;
            let mut words = Vec::new();
            while self.peek_type(Mode::Argument)? == TokenType::Word {
                words.push(self.expect_word(Mode::Argument)?);
            }
            items = Some(words);
            match self.peek_type(Mode::Argument)? {
                TokenType::Semicolon => {
                    self.next(Mode::Argument)?;
                }
                TokenType::Newline => {}
                _ => {
                    return self.unexpected_next(
                        Mode::Argument,
                        &[TokenType::Semicolon, TokenType::Newline],
                    )
                }
            }
        } else if self.peek_type(Mode::Argument)? == TokenType::Semicolon {
            self.next(Mode::Argument)?;
        }

        self.linebreak(Mode::Command)?;
        let do_pos = self.expect(TokenType::Do, Mode::Command)?;
        let body = self.compound_list()?;
        let done_pos = self.close(TokenType::Done)?;

        Ok(CmdExpr::For(ForClause {
            for_pos,
            name,
            items,
            do_pos,
            done_pos,
            body: Box::new(body),
        }))
    }

    fn parse_while(&mut self) -> Result<CmdExpr, ParseError> {
        let while_pos = self.open(TokenType::Done)?;
        let cond = self.compound_list()?;
        let do_pos = self.expect(TokenType::Do, Mode::Command)?;
        let body = self.compound_list()?;
        let done_pos = self.close(TokenType::Done)?;
        Ok(CmdExpr::While(WhileClause {
            while_pos,
            cond: Box::new(cond),
            do_pos,
            body: Box::new(body),
            done_pos,
        }))
    }

    fn parse_until(&mut self) -> Result<CmdExpr, ParseError> {
        let until_pos = self.open(TokenType::Done)?;
        let cond = self.compound_list()?;
        let do_pos = self.expect(TokenType::Do, Mode::Command)?;
        let body = self.compound_list()?;
        let done_pos = self.close(TokenType::Done)?;
        Ok(CmdExpr::Until(UntilClause {
            until_pos,
            cond: Box::new(cond),
            do_pos,
            body: Box::new(body),
            done_pos,
        }))
    }

    // ===========================================================================
    // CASE
    // ===========================================================================

    fn parse_case(&mut self) -> Result<CmdExpr, ParseError> {
        let case_pos = self.open(TokenType::Esac)?;
        let word = self.expect_word(Mode::Argument)?;
        self.linebreak(Mode::Argument)?;
        let token = self.next(Mode::Argument)?;
        if !token.is_lit("in") {
            return self.unexpected(&token, &[TokenType::In]);
        }

        let mut items = Vec::new();
        let esac_pos = loop {
            self.linebreak(Mode::Pattern)?;
            let token = self.next(Mode::Pattern)?;
            let first = match token.token_type {
                TokenType::Esac => break token.pos,
                TokenType::LParen => self.expect_word(Mode::Pattern)?,
                TokenType::Word => token.word.unwrap_or_default(),
                _ => return self.unexpected(&token, &[TokenType::Word, TokenType::Esac]),
            };
            let (patterns, rparen) = self.case_patterns(first)?;
            let body = self.parse_list(true)?.map(Box::new);

            let token = self.next(Mode::Command)?;
            let (op_pos, fallthrough) = match token.token_type {
                TokenType::DSemi => (token.pos, false),
                TokenType::SemiAnd => (token.pos, true),
                TokenType::Esac => {
                    items.push(CaseItem {
                        patterns,
                        rparen,
                        body,
                        op_pos: Position::default(),
                        fallthrough: false,
                    });
                    break token.pos;
                }
                _ => {
                    return self.unexpected(
                        &token,
                        &[TokenType::DSemi, TokenType::SemiAnd, TokenType::Esac],
                    )
                }
            };
            items.push(CaseItem {
                patterns,
                rparen,
                body,
                op_pos,
                fallthrough,
            });
        };
        self.scanner.leave();

        Ok(CmdExpr::Case(CaseClause {
            case_pos,
            word,
            items,
            esac_pos,
        }))
    }

    /// `pattern ('|' pattern)* ')'`, the first pattern already read.
    fn case_patterns(&mut self, first: Word) -> Result<(Vec<Word>, Position), ParseError> {
        let mut patterns = vec![first];
        loop {
            let token = self.next(Mode::Pattern)?;
            match token.token_type {
                TokenType::Pipe => patterns.push(self.expect_word(Mode::Pattern)?),
                TokenType::RParen => return Ok((patterns, token.pos)),
                _ => return self.unexpected(&token, &[TokenType::Pipe, TokenType::RParen]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::types::{Cmd, CmdExpr, Command, ElsePart, Position};
    use crate::parser::parser::parse;
    use crate::parser::types::ErrorKind;

    fn expr(src: &str) -> CmdExpr {
        let file = parse("t", src, None).unwrap();
        match file.commands.into_iter().next() {
            Some(Command::Cmd(Cmd { expr, .. })) => expr,
            other => panic!("expected a single command, got {:?}", other),
        }
    }

    fn message(src: &str) -> String {
        parse("t", src, None).unwrap_err().error.message
    }

    #[test]
    fn test_parse_subshell_and_group() {
        match expr("(a; b)") {
            CmdExpr::Subshell(sub) => {
                assert_eq!(sub.lparen, Position::new(1, 1));
                assert_eq!(sub.rparen, Position::new(1, 6));
                assert!(matches!(*sub.list, Command::List(_)));
            }
            other => panic!("expected subshell, got {:?}", other),
        }
        match expr("{ a; }") {
            CmdExpr::Group(group) => assert_eq!(group.rbrace, Position::new(1, 6)),
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn test_group_needs_separator_before_brace() {
        assert_eq!(message("{ echo }"), "unexpected EOF, expecting '}'");
    }

    #[test]
    fn test_parse_arith_eval() {
        match expr("((i++))") {
            CmdExpr::ArithEval(arith) => {
                assert_eq!(arith.expr.lit_value(), "i++");
                assert_eq!(arith.left, Position::new(1, 1));
                assert_eq!(arith.right, Position::new(1, 6));
            }
            other => panic!("expected arithmetic, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_elif_else() {
        match expr("if a; then b; elif c; then d; else e; fi") {
            CmdExpr::If(clause) => {
                assert_eq!(clause.then_pos, Position::new(1, 7));
                assert_eq!(clause.else_parts.len(), 2);
                assert!(matches!(clause.else_parts[0], ElsePart::Elif(_)));
                assert!(matches!(clause.else_parts[1], ElsePart::Else(_)));
                assert_eq!(clause.fi_pos, Position::new(1, 39));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_if_errors() {
        assert_eq!(message("if then fi"), "unexpected 'then'");
        assert_eq!(
            message("if a; then b"),
            "unexpected EOF, expecting 'fi' or 'elif' or 'else'"
        );
    }

    #[test]
    fn test_parse_for() {
        match expr("for i in a \"b c\"; do echo $i; done") {
            CmdExpr::For(clause) => {
                assert_eq!(clause.name.value, "i");
                assert_eq!(clause.items.as_ref().map(Vec::len), Some(2));
                assert_eq!(clause.done_pos, Position::new(1, 31));
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_for_item_forms() {
        let items = |src: &str| match expr(src) {
            CmdExpr::For(clause) => clause.items.map(|w| w.len()),
            other => panic!("expected for, got {:?}", other),
        };
        assert_eq!(items("for i; do :; done"), None);
        assert_eq!(items("for i do :; done"), None);
        assert_eq!(items("for i\ndo :; done"), None);
        assert_eq!(items("for i in; do :; done"), Some(0));
        assert_eq!(items("for i in a b\ndo :; done"), Some(2));
        assert_eq!(items("for i\nin a\ndo :; done"), Some(1));
    }

    #[test]
    fn test_invalid_for_variable() {
        let err = parse("t", "for 1x in a; do :; done", None).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::Invalid);
        assert_eq!(err.error.message, "invalid for loop variable");
        assert_eq!(err.error.pos, Position::new(1, 5));
    }

    #[test]
    fn test_parse_while_until() {
        assert!(matches!(expr("while a; do b; done"), CmdExpr::While(_)));
        match expr("until a\ndo\nb\ndone") {
            CmdExpr::Until(clause) => {
                assert_eq!(clause.do_pos, Position::new(2, 1));
                assert_eq!(clause.done_pos, Position::new(4, 1));
            }
            other => panic!("expected until, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_case() {
        let src = "case $x in\n(a|b) one;;\nc) two;&\n*) ;;\nesac";
        match expr(src) {
            CmdExpr::Case(clause) => {
                assert_eq!(clause.items.len(), 3);
                assert_eq!(clause.items[0].patterns.len(), 2);
                assert!(!clause.items[0].fallthrough);
                assert!(clause.items[1].fallthrough);
                assert!(clause.items[2].body.is_none());
                assert_eq!(clause.esac_pos, Position::new(5, 1));
            }
            other => panic!("expected case, got {:?}", other),
        }
    }

    #[test]
    fn test_case_last_item_without_terminator() {
        match expr("case x in y) z\nesac") {
            CmdExpr::Case(clause) => {
                assert_eq!(clause.items.len(), 1);
                assert_eq!(clause.items[0].op_pos, Position::default());
            }
            other => panic!("expected case, got {:?}", other),
        }
    }

    #[test]
    fn test_case_reserved_words_as_patterns() {
        match expr("case x in if|fi) echo done;; esac") {
            CmdExpr::Case(clause) => {
                assert_eq!(clause.items[0].patterns[0].as_lit(), Some("if"));
                assert_eq!(clause.items[0].patterns[1].as_lit(), Some("fi"));
            }
            other => panic!("expected case, got {:?}", other),
        }
    }

    #[test]
    fn test_case_needs_in() {
        assert_eq!(message("case x y"), "unexpected word, expecting 'in'");
    }

    #[test]
    fn test_compound_redirections() {
        let file = parse("t", "while read l; do :; done <input 2>/dev/null", None).unwrap();
        match &file.commands[0] {
            Command::Cmd(cmd) => assert_eq!(cmd.redirs.len(), 2),
            other => panic!("expected command, got {:?}", other),
        }
    }
}
