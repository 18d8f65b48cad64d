//! Recursive Descent Parser for POSIX Shell Scripts
//!
//! This parser pulls tokens from the scanner one at a time and produces a
//! `File`. It tells the scanner what it expects next (a command, an
//! argument, a case pattern) so reserved words and aliases are only
//! recognized where they may appear.
//!
//! Grammar:
//!   program      ::= linebreak (complete_cmd (newline_list complete_cmd)*)? linebreak
//!   complete_cmd ::= and_or ((';'|'&') and_or)* [';'|'&']
//!   and_or       ::= pipeline (('&&'|'||') linebreak pipeline)*
//!   pipeline     ::= ['!'] command ('|' linebreak command)*
//!   command      ::= compound redirect* | func_def | simple_command
//!   compound     ::= '(' list ')' | '{' list '}' | '((' arith '))'
//!                  | for | case | if | while | until

use crate::ast::types::{
    AndOrItem, AndOrList, AndOrOp, Cmd, Command, File, Pipeline, Position, Separator, SeparatorOp,
    Word, AST,
};
use crate::parser::alias::Aliases;
use crate::parser::heredoc::attach_heredocs;
use crate::parser::lexer::{Mode, Scanner, Token, TokenType};
use crate::parser::source::Session;
use crate::parser::types::{ErrorKind, Incomplete, ParseError, MAX_INPUT_SIZE};
use log::debug;
use std::io::Read;

/// Most candidates listed after "expecting"
const MAX_EXPECTED: usize = 4;

/// Main parser struct
pub struct Parser<'a> {
    pub(crate) scanner: Scanner<'a>,
    /// One token of lookahead, as classified by the last peek
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(session: &'a mut Session, aliases: Option<&'a dyn Aliases>) -> Self {
        Self {
            scanner: Scanner::new(session, aliases),
            peeked: None,
        }
    }

    /// A parser for the body of a substitution.
    pub(crate) fn nested(
        session: &'a mut Session,
        aliases: Option<&'a dyn Aliases>,
        backquoted: bool,
    ) -> Self {
        Self {
            scanner: Scanner::nested(session, aliases, backquoted),
            peeked: None,
        }
    }

    pub(crate) fn scanner_mut(&mut self) -> &mut Scanner<'a> {
        &mut self.scanner
    }

    pub(crate) fn name(&self) -> &str {
        self.scanner.name()
    }

    // ===========================================================================
    // HELPER METHODS
    // ===========================================================================

    /// Look at the next token as `mode` classifies it.
    pub(crate) fn peek(&mut self, mode: Mode) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => self.scanner.reclassify(token, mode),
            None => self.scanner.next_token(mode)?,
        };
        Ok(self.peeked.insert(token))
    }

    pub(crate) fn peek_type(&mut self, mode: Mode) -> Result<TokenType, ParseError> {
        Ok(self.peek(mode)?.token_type)
    }

    pub(crate) fn next(&mut self, mode: Mode) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(self.scanner.reclassify(token, mode)),
            None => self.scanner.next_token(mode),
        }
    }

    /// Consume a token of type `expected`, returning its position.
    pub(crate) fn expect(&mut self, expected: TokenType, mode: Mode) -> Result<Position, ParseError> {
        let token = self.next(mode)?;
        if token.token_type == expected {
            Ok(token.pos)
        } else {
            self.unexpected(&token, &[expected])
        }
    }

    /// Consume a plain word.
    pub(crate) fn expect_word(&mut self, mode: Mode) -> Result<Word, ParseError> {
        match self.next(mode)? {
            Token {
                token_type: TokenType::Word,
                word: Some(word),
                ..
            } => Ok(word),
            token => self.unexpected(&token, &[TokenType::Word]),
        }
    }

    pub(crate) fn unexpected<T>(&self, token: &Token, expecting: &[TokenType]) -> Result<T, ParseError> {
        let mut message = format!("unexpected {}", token.token_type.describe());
        if !expecting.is_empty() {
            let names: Vec<String> = expecting
                .iter()
                .take(MAX_EXPECTED)
                .map(TokenType::describe)
                .collect();
            message.push_str(", expecting ");
            message.push_str(&names.join(" or "));
        }
        Err(ParseError::syntax(self.name(), token.pos, message))
    }

    /// Fail on whatever token comes next.
    pub(crate) fn unexpected_next<T>(&mut self, mode: Mode, expecting: &[TokenType]) -> Result<T, ParseError> {
        let token = self.peek(mode)?.clone();
        self.unexpected(&token, expecting)
    }

    /// Skip any number of newlines.
    pub(crate) fn linebreak(&mut self, mode: Mode) -> Result<(), ParseError> {
        while self.peek_type(mode)? == TokenType::Newline {
            self.next(mode)?;
        }
        Ok(())
    }

    /// Whether the next token can begin a command.
    pub(crate) fn starts_command(&mut self) -> Result<bool, ParseError> {
        let token_type = self.peek_type(Mode::Command)?;
        Ok(token_type.redir_op().is_some()
            || matches!(
                token_type,
                TokenType::Word
                    | TokenType::IoNumber
                    | TokenType::ArithCmd
                    | TokenType::Bang
                    | TokenType::LBrace
                    | TokenType::LParen
                    | TokenType::For
                    | TokenType::Case
                    | TokenType::If
                    | TokenType::While
                    | TokenType::Until
            ))
    }

    // ===========================================================================
    // PROGRAM & SUBSTITUTIONS
    // ===========================================================================

    /// Parse complete commands until EOF, adding each to `file` as soon as
    /// it and its here-documents are complete.
    fn parse_program(&mut self, file: &mut File) -> Result<(), ParseError> {
        loop {
            self.linebreak(Mode::Command)?;
            if self.peek_type(Mode::Command)? == TokenType::Eof {
                return Ok(());
            }
            let Some(mut command) = self.parse_list(false)? else {
                return self.unexpected_next(Mode::Command, &[]);
            };
            attach_heredocs(
                std::slice::from_mut(&mut command),
                &mut self.scanner.session().heredocs,
            );
            file.commands.push(command);
            if !matches!(
                self.peek_type(Mode::Command)?,
                TokenType::Newline | TokenType::Eof
            ) {
                return self.unexpected_next(Mode::Command, &[]);
            }
        }
    }

    /// Parse the commands of a substitution up to `closer`, returning them
    /// with the closer's position. Nothing after the closer is read.
    pub(crate) fn parse_subst(&mut self, closer: TokenType) -> Result<(Vec<Command>, Position), ParseError> {
        let mut commands = Vec::new();
        loop {
            self.linebreak(Mode::Command)?;
            let token = self.peek(Mode::Command)?;
            if token.token_type == closer {
                let pos = token.pos;
                self.peeked = None;
                return Ok((commands, pos));
            }
            match self.parse_list(false)? {
                Some(command) => commands.push(command),
                None => return self.unexpected_next(Mode::Command, &[closer]),
            }
            let token_type = self.peek_type(Mode::Command)?;
            if token_type != TokenType::Newline && token_type != closer {
                return self.unexpected_next(Mode::Command, &[closer]);
            }
        }
    }

    // ===========================================================================
    // LISTS
    // ===========================================================================

    /// A sequence of and-or lists separated by `;` or `&`. With `multiline`
    /// newlines separate items too, as in the body of a compound command;
    /// otherwise the list ends at the first newline. None if there is no
    /// command at all.
    pub(crate) fn parse_list(&mut self, multiline: bool) -> Result<Option<Command>, ParseError> {
        let mut items = Vec::new();
        loop {
            if multiline {
                self.linebreak(Mode::Command)?;
            }
            if !self.starts_command()? {
                break;
            }
            let mut item = self.and_or()?;
            let token = self.peek(Mode::Command)?;
            let op = match token.token_type {
                TokenType::Semicolon => Some(SeparatorOp::Semi),
                TokenType::Amp => Some(SeparatorOp::Amp),
                _ => None,
            };
            let pos = token.pos;
            let at_newline = token.token_type == TokenType::Newline;
            if let Some(op) = op {
                self.next(Mode::Command)?;
                item.sep = Some(Separator { pos, op });
                items.push(item);
                continue;
            }
            items.push(item);
            if !(multiline && at_newline) {
                break;
            }
        }
        Ok(AST::list(items))
    }

    /// The list forming the body of a compound command; it may not be empty.
    pub(crate) fn compound_list(&mut self) -> Result<Command, ParseError> {
        match self.parse_list(true)? {
            Some(list) => Ok(list),
            None => self.unexpected_next(Mode::Command, &[]),
        }
    }

    fn and_or(&mut self) -> Result<AndOrList, ParseError> {
        let first = self.pipeline()?;
        let mut rest = Vec::new();
        loop {
            let token = self.peek(Mode::Command)?;
            let op = match token.token_type {
                TokenType::AndAnd => AndOrOp::And,
                TokenType::OrOr => AndOrOp::Or,
                _ => break,
            };
            let op_pos = token.pos;
            self.next(Mode::Command)?;
            self.linebreak(Mode::Command)?;
            let pipeline = self.pipeline()?;
            rest.push(AndOrItem {
                op_pos,
                op,
                pipeline,
            });
        }
        Ok(AST::and_or(first, rest))
    }

    fn pipeline(&mut self) -> Result<Pipeline, ParseError> {
        let token = self.peek(Mode::Command)?;
        let bang = (token.token_type == TokenType::Bang).then_some(token.pos);
        if bang.is_some() {
            self.next(Mode::Command)?;
        }
        let mut cmds = vec![self.command()?];
        while self.peek_type(Mode::Command)? == TokenType::Pipe {
            self.next(Mode::Command)?;
            self.linebreak(Mode::Command)?;
            cmds.push(self.command()?);
        }
        Ok(AST::pipeline(bang, cmds))
    }

    fn command(&mut self) -> Result<Cmd, ParseError> {
        let token_type = self.peek_type(Mode::Command)?;
        match token_type {
            TokenType::Word | TokenType::IoNumber => self.simple_command(),
            t if t.redir_op().is_some() => self.simple_command(),
            _ => self.compound_command(),
        }
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Parse a whole script. On failure the error comes with every command and
/// comment completed before it.
pub fn parse(name: &str, src: &str, aliases: Option<&dyn Aliases>) -> Result<File, Incomplete> {
    let mut file = File {
        name: name.to_string(),
        ..File::default()
    };
    if src.len() > MAX_INPUT_SIZE {
        let error = ParseError::invalid(
            name,
            Position::new(1, 1),
            format!("input too large: {} bytes exceeds limit of {}", src.len(), MAX_INPUT_SIZE),
        );
        return Err(Incomplete { file, error });
    }
    debug!("parsing {} ({} bytes)", name, src.len());

    let mut session = Session::new(name, src);
    let mut parser = Parser::new(&mut session, aliases);
    let result = parser.parse_program(&mut file);
    file.comments = parser.scanner.take_comments();

    match result {
        Ok(()) => Ok(file),
        Err(error) => {
            debug!("parse failed: {}", error);
            Err(Incomplete { file, error })
        }
    }
}

/// Read `reader` to the end and parse it.
pub fn parse_reader<R: Read>(
    name: &str,
    reader: R,
    aliases: Option<&dyn Aliases>,
) -> Result<File, Incomplete> {
    let mut src = String::new();
    if let Err(err) = reader.take(MAX_INPUT_SIZE as u64 + 1).read_to_string(&mut src) {
        let file = File {
            name: name.to_string(),
            ..File::default()
        };
        let error = ParseError::new(ErrorKind::Io, name, Position::default(), err.to_string());
        return Err(Incomplete { file, error });
    }
    parse(name, &src, aliases)
}
