//! Simple Command Parser
//!
//! Handles parsing of simple commands: assignments, words, redirections,
//! plus function definitions, which start out looking like a simple
//! command.

use crate::ast::types::{Assign, Cmd, CmdExpr, FuncDef, Lit, Redir, Word, WordPart, AST};
use crate::parser::lexer::{is_valid_name, Mode, Token, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::ParseError;
use std::collections::HashSet;

lazy_static::lazy_static! {
    /// POSIX special builtins, which cannot be redefined as functions
    static ref SPECIAL_BUILTINS: HashSet<&'static str> = [
        "break", ":", "continue", ".", "eval", "exec", "exit", "export",
        "readonly", "return", "set", "shift", "times", "trap", "unset",
    ]
    .into_iter()
    .collect();
}

/// Split `NAME=value` into an assignment. Gives the word back if its
/// leading literal is not a valid name followed by `=`.
fn split_assign(word: Word) -> Result<Assign, Word> {
    let Some(WordPart::Lit(first)) = word.parts.first() else {
        return Err(word);
    };
    let Some((name, value)) = first.value.split_once('=') else {
        return Err(word);
    };
    if !is_valid_name(name) {
        return Err(word);
    }

    let name_lit = AST::lit(first.pos, name);
    let value_pos = first.pos.shift(name.chars().count() + 1);
    let mut parts = Vec::with_capacity(word.parts.len());
    if !value.is_empty() {
        parts.push(WordPart::Lit(AST::lit(value_pos, value)));
    }
    parts.extend(word.parts.into_iter().skip(1));
    Ok(Assign {
        name: name_lit,
        value: AST::word(value_pos, parts),
    })
}

/// The descriptor number of an IO_NUMBER token.
fn io_number(token: Token) -> Option<Lit> {
    match token.word?.parts.into_iter().next()? {
        WordPart::Lit(lit) => Some(lit),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    pub(crate) fn simple_command(&mut self) -> Result<Cmd, ParseError> {
        let mut assigns = Vec::new();
        let mut args: Vec<Word> = Vec::new();
        let mut redirs = Vec::new();
        // reserved words only as the first token; aliases up to the command name
        let mut mode = Mode::Command;

        loop {
            let token_type = self.peek_type(mode)?;
            if token_type == TokenType::IoNumber || token_type.redir_op().is_some() {
                redirs.push(self.redirection()?);
            } else if token_type == TokenType::Word {
                let word = self.expect_word(mode)?;
                if !args.is_empty() {
                    args.push(word);
                } else {
                    match split_assign(word) {
                        Ok(assign) => assigns.push(assign),
                        Err(word) => {
                            if assigns.is_empty() && redirs.is_empty() {
                                if let Some(name) = word.as_lit().filter(|n| is_valid_name(n)) {
                                    if self.peek_type(Mode::Argument)? == TokenType::LParen {
                                        let name = AST::lit(word.pos, name);
                                        return self.function_def(name);
                                    }
                                }
                            }
                            args.push(word);
                        }
                    }
                }
            } else {
                break;
            }
            mode = if args.is_empty() && redirs.is_empty() && !assigns.is_empty() {
                Mode::CommandName
            } else {
                Mode::Argument
            };
        }

        if assigns.is_empty() && args.is_empty() && redirs.is_empty() {
            return self.unexpected_next(mode, &[]);
        }
        Ok(AST::simple_command(assigns, args, redirs))
    }

    /// `[n]op word`
    pub(crate) fn redirection(&mut self) -> Result<Redir, ParseError> {
        let mut token = self.next(Mode::Argument)?;
        let mut fd = None;
        if token.token_type == TokenType::IoNumber {
            fd = io_number(token);
            token = self.next(Mode::Argument)?;
        }
        let Some(op) = token.token_type.redir_op() else {
            return self.unexpected(&token, &[]);
        };
        let op_pos = token.pos;
        let target = self.expect_word(Mode::Argument)?;
        let hdoc_id = if op.is_heredoc() {
            Some(self.scanner.push_heredoc(op_pos, &target)?)
        } else {
            None
        };
        let mut redir = AST::redirection(fd, op_pos, op, target);
        redir.hdoc_id = hdoc_id;
        Ok(redir)
    }

    /// Redirections following a compound command.
    pub(crate) fn trailing_redirections(&mut self) -> Result<Vec<Redir>, ParseError> {
        let mut redirs = Vec::new();
        loop {
            let token_type = self.peek_type(Mode::Argument)?;
            if token_type != TokenType::IoNumber && token_type.redir_op().is_none() {
                return Ok(redirs);
            }
            redirs.push(self.redirection()?);
        }
    }

    /// `name ( ) linebreak compound-command`, with the `(` peeked.
    fn function_def(&mut self, name: Lit) -> Result<Cmd, ParseError> {
        if SPECIAL_BUILTINS.contains(name.value.as_str()) {
            return Err(ParseError::invalid(
                self.name(),
                name.pos,
                format!("invalid function name: {}", name.value),
            ));
        }
        self.next(Mode::Argument)?;
        self.expect(TokenType::RParen, Mode::Argument)?;
        self.linebreak(Mode::Command)?;
        let body = self.compound_command()?;
        Ok(Cmd {
            expr: CmdExpr::FuncDef(FuncDef {
                name,
                body: Box::new(body),
            }),
            redirs: Vec::new(),
        })
    }
}
