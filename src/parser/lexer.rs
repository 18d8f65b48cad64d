//! Scanner for POSIX Shell Scripts
//!
//! The scanner turns the character source into tokens the grammar pulls one
//! at a time. Words come out fully structured: quoting, parameter
//! expansions and command/arithmetic substitutions are resolved while the
//! word is read, so a token never needs re-parsing. It handles:
//! - Operators and delimiters
//! - Words, reserved words and IO numbers
//! - Comments
//! - Here-document bodies (after the line that declared them)
//! - Alias substitution

use crate::ast::types::{Comment, Position, QuoteKind, RedirOp, Word, WordPart, AST};
use crate::parser::alias::{self, Aliases};
use crate::parser::heredoc::PendingHeredoc;
use crate::parser::parser_substitution::dparen_is_subshell;
use crate::parser::source::{Cursor, Session};
use crate::parser::types::{ParseError, MAX_PARSER_DEPTH};
use log::debug;
use std::collections::{HashMap, VecDeque};

/// Token types produced by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // End of input
    Eof,
    Newline,

    // Operators
    Semicolon, // ;
    Amp,       // &
    Pipe,      // |
    AndAnd,    // &&
    OrOr,      // ||
    DSemi,     // ;;
    SemiAnd,   // ;&
    LParen,    // (
    RParen,    // )

    // Redirections
    Less,      // <
    Great,     // >
    Clobber,   // >|
    DGreat,    // >>
    DLess,     // <<
    DLessDash, // <<-
    LessAnd,   // <&
    GreatAnd,  // >&
    LessGreat, // <>

    // Reserved words
    Bang,
    LBrace,
    RBrace,
    For,
    Case,
    Esac,
    In,
    If,
    Elif,
    Then,
    Else,
    Fi,
    While,
    Until,
    Do,
    Done,

    // Words
    Word,
    IoNumber,
    /// `(( expr ))` read as a whole
    ArithCmd,
    /// The backtick closing the substitution being scanned
    BackQuote,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Newline => "newline",
            Self::Semicolon => ";",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::DSemi => ";;",
            Self::SemiAnd => ";&",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Less => "<",
            Self::Great => ">",
            Self::Clobber => ">|",
            Self::DGreat => ">>",
            Self::DLess => "<<",
            Self::DLessDash => "<<-",
            Self::LessAnd => "<&",
            Self::GreatAnd => ">&",
            Self::LessGreat => "<>",
            Self::Bang => "!",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::For => "for",
            Self::Case => "case",
            Self::Esac => "esac",
            Self::In => "in",
            Self::If => "if",
            Self::Elif => "elif",
            Self::Then => "then",
            Self::Else => "else",
            Self::Fi => "fi",
            Self::While => "while",
            Self::Until => "until",
            Self::Do => "do",
            Self::Done => "done",
            Self::Word => "word",
            Self::IoNumber => "word",
            Self::ArithCmd => "((",
            Self::BackQuote => "`",
        }
    }

    /// How the token is named in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Eof | Self::Newline | Self::Word | Self::IoNumber => self.as_str().to_string(),
            _ => format!("'{}'", self.as_str()),
        }
    }

    pub fn is_reserved(&self) -> bool {
        RESERVED_WORDS.values().any(|t| t == self)
    }

    pub fn redir_op(&self) -> Option<RedirOp> {
        Some(match self {
            Self::Less => RedirOp::Less,
            Self::Great => RedirOp::Great,
            Self::Clobber => RedirOp::Clobber,
            Self::DGreat => RedirOp::DGreat,
            Self::DLess => RedirOp::DLess,
            Self::DLessDash => RedirOp::DLessDash,
            Self::LessAnd => RedirOp::LessAnd,
            Self::GreatAnd => RedirOp::GreatAnd,
            Self::LessGreat => RedirOp::LessGreat,
            _ => return None,
        })
    }
}

/// What the grammar is looking for, which decides how words are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Start of a command: reserved words, aliases and `((` are recognized.
    Command,
    /// The command name after assignments: aliases are recognized, reserved
    /// words and `((` are not.
    CommandName,
    /// Any other word position.
    Argument,
    /// A case pattern: only `esac` is reserved.
    Pattern,
}

/// A token produced by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub pos: Position,
    /// The word behind WORD, IO_NUMBER and reserved-word tokens; the
    /// expression of an arithmetic command.
    pub word: Option<Word>,
    /// Position of the closing `))` of an arithmetic command.
    pub end: Position,
}

impl Token {
    pub fn op(token_type: TokenType, pos: Position) -> Self {
        Self {
            token_type,
            pos,
            word: None,
            end: Position::default(),
        }
    }

    pub fn word(token_type: TokenType, word: Word) -> Self {
        Self {
            token_type,
            pos: word.pos,
            word: Some(word),
            end: Position::default(),
        }
    }

    /// Whether this is a word consisting of exactly the unquoted text `lit`.
    pub fn is_lit(&self, lit: &str) -> bool {
        self.word.as_ref().and_then(Word::as_lit) == Some(lit)
    }
}

lazy_static::lazy_static! {
    /// Reserved words, honored only where a command may start
    static ref RESERVED_WORDS: HashMap<&'static str, TokenType> = {
        let mut m = HashMap::new();
        m.insert("!", TokenType::Bang);
        m.insert("{", TokenType::LBrace);
        m.insert("}", TokenType::RBrace);
        m.insert("for", TokenType::For);
        m.insert("case", TokenType::Case);
        m.insert("esac", TokenType::Esac);
        m.insert("in", TokenType::In);
        m.insert("if", TokenType::If);
        m.insert("elif", TokenType::Elif);
        m.insert("then", TokenType::Then);
        m.insert("else", TokenType::Else);
        m.insert("fi", TokenType::Fi);
        m.insert("while", TokenType::While);
        m.insert("until", TokenType::Until);
        m.insert("do", TokenType::Do);
        m.insert("done", TokenType::Done);
        m
    };
}

/// Check if a string is a valid XBD name
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Check if a character ends an unquoted word
fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

/// The token type of `word` when read in `mode`.
pub fn classify(word: &Word, mode: Mode) -> TokenType {
    let Some(lit) = word.as_lit() else {
        return TokenType::Word;
    };
    match mode {
        Mode::Command => RESERVED_WORDS.get(lit).copied().unwrap_or(TokenType::Word),
        Mode::Pattern if lit == "esac" => TokenType::Esac,
        _ => TokenType::Word,
    }
}

/// Accumulates the parts of a word, merging adjacent characters into one
/// literal.
#[derive(Debug)]
pub(crate) struct WordBuilder {
    pos: Position,
    parts: Vec<WordPart>,
    lit: String,
    lit_pos: Position,
}

impl WordBuilder {
    pub(crate) fn new(pos: Position) -> Self {
        Self {
            pos,
            parts: Vec::new(),
            lit: String::new(),
            lit_pos: pos,
        }
    }

    pub(crate) fn push_char(&mut self, c: char, at: Position) {
        if self.lit.is_empty() {
            self.lit_pos = at;
        }
        self.lit.push(c);
    }

    /// End the current literal; the next character starts a new one.
    pub(crate) fn flush(&mut self) {
        if !self.lit.is_empty() {
            let value = std::mem::take(&mut self.lit);
            self.parts.push(WordPart::Lit(AST::lit(self.lit_pos, value)));
        }
    }

    pub(crate) fn push_part(&mut self, part: WordPart) {
        self.flush();
        self.parts.push(part);
    }

    pub(crate) fn finish(mut self) -> Word {
        self.flush();
        AST::word(self.pos, self.parts)
    }
}

/// Scanner state machine
pub struct Scanner<'a> {
    session: &'a mut Session,
    aliases: Option<&'a dyn Aliases>,
    /// Closers the grammar is waiting for, innermost last
    stack: Vec<TokenType>,
    heredocs: VecDeque<PendingHeredoc>,
    comments: Vec<Comment>,
    /// This scanner reads the body of a backtick substitution
    backquoted: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(session: &'a mut Session, aliases: Option<&'a dyn Aliases>) -> Self {
        Self {
            session,
            aliases,
            stack: Vec::new(),
            heredocs: VecDeque::new(),
            comments: Vec::new(),
            backquoted: false,
        }
    }

    /// A scanner for the body of a substitution, continuing on the same
    /// source.
    pub(crate) fn nested(
        session: &'a mut Session,
        aliases: Option<&'a dyn Aliases>,
        backquoted: bool,
    ) -> Self {
        let mut scanner = Self::new(session, aliases);
        scanner.backquoted = backquoted;
        scanner
    }

    pub fn name(&self) -> &str {
        &self.session.name
    }

    pub(crate) fn session(&mut self) -> &mut Session {
        self.session
    }

    pub(crate) fn aliases(&self) -> Option<&'a dyn Aliases> {
        self.aliases
    }

    /// Record that the grammar entered a construct closed by `closer`.
    pub fn enter(&mut self, closer: TokenType, pos: Position) -> Result<(), ParseError> {
        self.descend(pos)?;
        self.stack.push(closer);
        Ok(())
    }

    pub fn leave(&mut self) {
        if self.stack.pop().is_some() {
            self.ascend();
        }
    }

    /// Number of constructs entered and not yet closed.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn descend(&mut self, pos: Position) -> Result<(), ParseError> {
        if self.session.depth >= MAX_PARSER_DEPTH {
            return Err(ParseError::invalid(
                self.name(),
                pos,
                "maximum nesting depth exceeded",
            ));
        }
        self.session.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.session.depth = self.session.depth.saturating_sub(1);
    }

    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    pub(crate) fn adopt_comments(&mut self, comments: Vec<Comment>) {
        self.comments.extend(comments);
    }

    pub(crate) fn pending_heredocs(&mut self) -> &mut VecDeque<PendingHeredoc> {
        &mut self.heredocs
    }

    // ===========================================================================
    // CHARACTER ACCESS
    // ===========================================================================

    pub(crate) fn cursor(&self) -> &Cursor {
        &self.session.cursor
    }

    pub(crate) fn pos(&self) -> Position {
        self.session.cursor.pos()
    }

    pub(crate) fn read(&mut self) -> Option<char> {
        self.session.cursor.read()
    }

    pub(crate) fn unread(&mut self) {
        self.session.cursor.unread()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.session.cursor.peek()
    }

    fn closes_backquote(&self) -> bool {
        self.backquoted && self.stack.is_empty()
    }

    fn skip_blanks(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t') => {
                    self.read();
                }
                Some('\\') if self.cursor().peek_nth(1) == Some('\n') => {
                    // Line continuation
                    self.read();
                    self.read();
                }
                _ => break,
            }
        }
    }

    // ===========================================================================
    // TOKENS
    // ===========================================================================

    /// Scan the next token for a grammar looking for `mode`.
    pub fn next_token(&mut self, mode: Mode) -> Result<Token, ParseError> {
        loop {
            self.skip_blanks();
            self.session.cursor.settle();
            let chain = self.session.cursor.take_alias_chain();
            let pos = self.pos();
            let Some(c) = self.read() else {
                // Anything still pending can no longer find its delimiter
                if !self.heredocs.is_empty() {
                    self.scan_heredoc_bodies()?;
                }
                return Ok(Token::op(TokenType::Eof, pos));
            };
            match c {
                '\n' => {
                    if !self.heredocs.is_empty() {
                        self.scan_heredoc_bodies()?;
                    }
                    return Ok(Token::op(TokenType::Newline, pos));
                }
                '#' => self.scan_comment(pos),
                '`' if self.closes_backquote() => return Ok(Token::op(TokenType::BackQuote, pos)),
                '&' | '|' | ';' | '(' | ')' | '<' | '>' => return self.scan_operator(c, pos, mode),
                _ => {
                    self.unread();
                    if let Some(token) = self.scan_word(mode, chain)? {
                        return Ok(token);
                    }
                    // an alias was substituted; scan its replacement
                }
            }
        }
    }

    /// Re-derive a peeked token's type for a grammar now looking for `mode`.
    pub fn reclassify(&self, mut token: Token, mode: Mode) -> Token {
        if token.token_type == TokenType::Word || token.token_type.is_reserved() {
            if let Some(word) = &token.word {
                token.token_type = classify(word, mode);
            }
        }
        token
    }

    fn scan_comment(&mut self, hash: Position) {
        let mut text = String::new();
        while let Some(c) = self.read() {
            if c == '\n' {
                self.unread();
                break;
            }
            text.push(c);
        }
        self.comments.push(Comment { hash, text });
    }

    fn scan_operator(&mut self, c: char, pos: Position, mode: Mode) -> Result<Token, ParseError> {
        let next = self.peek();
        let (token_type, width) = match c {
            '&' if next == Some('&') => (TokenType::AndAnd, 2),
            '&' => (TokenType::Amp, 1),
            '|' if next == Some('|') => (TokenType::OrOr, 2),
            '|' => (TokenType::Pipe, 1),
            ';' if next == Some(';') => (TokenType::DSemi, 2),
            ';' if next == Some('&') => (TokenType::SemiAnd, 2),
            ';' => (TokenType::Semicolon, 1),
            '(' if next == Some('(')
                && mode == Mode::Command
                && !dparen_is_subshell(self.cursor().lookahead().skip(1)) =>
            {
                self.read();
                return self.scan_arith_command(pos);
            }
            '(' => (TokenType::LParen, 1),
            ')' => (TokenType::RParen, 1),
            '<' => match next {
                Some('<') if self.cursor().peek_nth(1) == Some('-') => (TokenType::DLessDash, 3),
                Some('<') => (TokenType::DLess, 2),
                Some('&') => (TokenType::LessAnd, 2),
                Some('>') => (TokenType::LessGreat, 2),
                _ => (TokenType::Less, 1),
            },
            _ => match next {
                Some('>') => (TokenType::DGreat, 2),
                Some('&') => (TokenType::GreatAnd, 2),
                Some('|') => (TokenType::Clobber, 2),
                _ => (TokenType::Great, 1),
            },
        };
        for _ in 1..width {
            self.read();
        }
        Ok(Token::op(token_type, pos))
    }

    fn scan_arith_command(&mut self, left: Position) -> Result<Token, ParseError> {
        let (expr, right) = self.scan_arith(left)?;
        Ok(Token {
            token_type: TokenType::ArithCmd,
            pos: left,
            word: Some(expr),
            end: right,
        })
    }

    // ===========================================================================
    // WORDS
    // ===========================================================================

    /// Scan one word. Returns None when the word was an alias whose
    /// replacement has been pushed onto the source instead.
    fn scan_word(&mut self, mode: Mode, chain: bool) -> Result<Option<Token>, ParseError> {
        let mut wb = WordBuilder::new(self.pos());
        loop {
            let at = self.pos();
            let Some(c) = self.read() else {
                break;
            };
            match c {
                c if is_word_boundary(c) => {
                    self.unread();
                    break;
                }
                '`' if self.closes_backquote() => {
                    self.unread();
                    break;
                }
                '\\' => self.scan_backslash(&mut wb, at),
                '\'' => {
                    let part = self.scan_single_quote(at)?;
                    wb.push_part(part);
                }
                '"' => {
                    let part = self.scan_double_quote(at)?;
                    wb.push_part(part);
                }
                '$' => self.scan_dollar(&mut wb, at, false)?,
                '`' => {
                    let part = self.scan_cmd_subst(at, true)?;
                    wb.push_part(part);
                }
                c => wb.push_char(c, at),
            }
        }
        let word = wb.finish();

        if matches!(self.peek(), Some('<' | '>')) {
            if let Some(lit) = word.as_lit() {
                if lit.chars().all(|c| c.is_ascii_digit()) {
                    return Ok(Some(Token::word(TokenType::IoNumber, word)));
                }
            }
        }
        let token_type = classify(&word, mode);
        if token_type == TokenType::Word
            && (matches!(mode, Mode::Command | Mode::CommandName) || chain)
            && self.substitute_alias(&word)
        {
            return Ok(None);
        }
        Ok(Some(Token::word(token_type, word)))
    }

    /// `\` outside any quotes: escapes the next character, or joins lines.
    fn scan_backslash(&mut self, wb: &mut WordBuilder, at: Position) {
        if !self.scan_escape(wb, at) {
            wb.push_part(AST::quote(at, QuoteKind::Backslash, AST::word(self.pos(), vec![])));
        }
    }

    /// Escape the character after an unquoted `\`. Returns false at EOF.
    pub(crate) fn scan_escape(&mut self, wb: &mut WordBuilder, at: Position) -> bool {
        let inner = self.pos();
        match self.read() {
            Some('\n') => {
                wb.flush();
                true
            }
            Some(c) => {
                let word = AST::lit_word(inner, c.to_string());
                wb.push_part(AST::quote(at, QuoteKind::Backslash, word));
                true
            }
            None => false,
        }
    }

    /// Replace a command-position word by its alias, unless the alias is
    /// already being substituted.
    fn substitute_alias(&mut self, word: &Word) -> bool {
        let Some(aliases) = self.aliases else {
            return false;
        };
        let Some(name) = word.as_lit() else {
            return false;
        };
        if self.session.cursor.alias_active(name) {
            return false;
        }
        let Some(value) = aliases.lookup(name) else {
            return false;
        };
        debug!("alias substitution at {}: {} -> {:?}", word.pos, name, value);
        let text = alias::replacement_text(value);
        self.session
            .cursor
            .push_alias(name, &text, word.pos, alias::chains(value));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::ParamOp;

    fn tokens(src: &str, mode: Mode) -> Vec<Token> {
        let mut session = Session::new("t", src);
        let mut scanner = Scanner::new(&mut session, None);
        let mut out = Vec::new();
        loop {
            let tok = scanner.next_token(mode).unwrap();
            let done = tok.token_type == TokenType::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    fn types(src: &str, mode: Mode) -> Vec<TokenType> {
        tokens(src, mode).iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_simple_command() {
        let toks = tokens("echo hello", Mode::Argument);
        assert_eq!(toks.len(), 3); // echo, hello, EOF
        assert!(toks[0].is_lit("echo"));
        assert!(toks[1].is_lit("hello"));
        assert_eq!(toks[1].pos, Position::new(1, 6));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            types("a && b || c | d ; e & f ;; ;&", Mode::Argument),
            vec![
                TokenType::Word,
                TokenType::AndAnd,
                TokenType::Word,
                TokenType::OrOr,
                TokenType::Word,
                TokenType::Pipe,
                TokenType::Word,
                TokenType::Semicolon,
                TokenType::Word,
                TokenType::Amp,
                TokenType::Word,
                TokenType::DSemi,
                TokenType::SemiAnd,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_redirection_operators() {
        assert_eq!(
            types("< > >| >> <& >& <>", Mode::Argument),
            vec![
                TokenType::Less,
                TokenType::Great,
                TokenType::Clobber,
                TokenType::DGreat,
                TokenType::LessAnd,
                TokenType::GreatAnd,
                TokenType::LessGreat,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_operator_ends_word() {
        let toks = tokens("foo;bar", Mode::Argument);
        assert!(toks[0].is_lit("foo"));
        assert_eq!(toks[1].token_type, TokenType::Semicolon);
        assert!(toks[2].is_lit("bar"));
    }

    #[test]
    fn test_io_number() {
        let toks = tokens("2>err 3 >x", Mode::Argument);
        assert_eq!(toks[0].token_type, TokenType::IoNumber);
        assert_eq!(toks[1].token_type, TokenType::Great);
        assert_eq!(toks[3].token_type, TokenType::Word);
    }

    #[test]
    fn test_reserved_words_only_in_command_mode() {
        assert_eq!(types("if", Mode::Command)[0], TokenType::If);
        assert_eq!(types("if", Mode::Argument)[0], TokenType::Word);
        assert_eq!(types("'if'", Mode::Command)[0], TokenType::Word);
        assert_eq!(types("esac", Mode::Pattern)[0], TokenType::Esac);
        assert_eq!(types("fi", Mode::Pattern)[0], TokenType::Word);
    }

    #[test]
    fn test_reclassify_peeked_word() {
        let mut session = Session::new("t", "fi");
        let mut scanner = Scanner::new(&mut session, None);
        let tok = scanner.next_token(Mode::Argument).unwrap();
        assert_eq!(tok.token_type, TokenType::Word);
        let tok = scanner.reclassify(tok, Mode::Command);
        assert_eq!(tok.token_type, TokenType::Fi);
    }

    #[test]
    fn test_newline_and_comment() {
        let mut session = Session::new("t", "a # note\nb");
        let mut scanner = Scanner::new(&mut session, None);
        assert!(scanner.next_token(Mode::Argument).unwrap().is_lit("a"));
        let nl = scanner.next_token(Mode::Argument).unwrap();
        assert_eq!(nl.token_type, TokenType::Newline);
        assert_eq!(nl.pos, Position::new(1, 9));
        let comments = scanner.take_comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, " note");
        assert_eq!(comments[0].hash, Position::new(1, 3));
    }

    #[test]
    fn test_hash_inside_word_is_literal() {
        let toks = tokens("a#b", Mode::Argument);
        assert!(toks[0].is_lit("a#b"));
    }

    #[test]
    fn test_line_continuation_between_words() {
        let toks = tokens("a \\\nb", Mode::Argument);
        assert!(toks[1].is_lit("b"));
        assert_eq!(toks[1].pos, Position::new(2, 1));
    }

    #[test]
    fn test_escaped_character() {
        let toks = tokens("a\\ b", Mode::Argument);
        let word = toks[0].word.as_ref().unwrap();
        assert_eq!(word.parts.len(), 3);
        assert_eq!(word.lit_value(), "a b");
    }

    #[test]
    fn test_dollar_without_name_is_literal() {
        let toks = tokens("$ a$", Mode::Argument);
        assert!(toks[0].is_lit("$"));
        assert!(toks[1].is_lit("a$"));
    }

    #[test]
    fn test_param_inside_word() {
        let toks = tokens("pre${x:-d}post", Mode::Argument);
        let word = toks[0].word.as_ref().unwrap();
        assert_eq!(word.parts.len(), 3);
        match &word.parts[1] {
            WordPart::ParamExp(p) => {
                assert_eq!(p.name.value, "x");
                assert_eq!(p.op, ParamOp::DefaultUnsetOrNull);
            }
            other => panic!("expected parameter expansion, got {:?}", other),
        }
    }

    #[test]
    fn test_arith_command_token() {
        let toks = tokens("((x = 1 + 2))", Mode::Command);
        assert_eq!(toks[0].token_type, TokenType::ArithCmd);
        assert_eq!(toks[0].word.as_ref().unwrap().lit_value(), "x = 1 + 2");
        assert_eq!(toks[0].end, Position::new(1, 12));
    }

    #[test]
    fn test_nested_subshells_not_arith() {
        assert_eq!(
            types("((echo a) | b)", Mode::Command)[..2],
            [TokenType::LParen, TokenType::LParen]
        );
        assert_eq!(types("((", Mode::Argument)[..2], [TokenType::LParen, TokenType::LParen]);
    }

    #[test]
    fn test_alias_substitution() {
        let mut table = HashMap::new();
        table.insert("ll".to_string(), "ls -l".to_string());
        let mut session = Session::new("t", "ll x");
        let mut scanner = Scanner::new(&mut session, Some(&table));
        let first = scanner.next_token(Mode::Command).unwrap();
        assert!(first.is_lit("ls"));
        assert_eq!(first.pos, Position::new(1, 1));
        assert!(scanner.next_token(Mode::Argument).unwrap().is_lit("-l"));
        let x = scanner.next_token(Mode::Argument).unwrap();
        assert!(x.is_lit("x"));
        assert_eq!(x.pos, Position::new(1, 4));
    }

    #[test]
    fn test_alias_loop_guard() {
        let mut table = HashMap::new();
        table.insert("ls".to_string(), "ls --color".to_string());
        let mut session = Session::new("t", "ls");
        let mut scanner = Scanner::new(&mut session, Some(&table));
        assert!(scanner.next_token(Mode::Command).unwrap().is_lit("ls"));
        assert!(scanner.next_token(Mode::Argument).unwrap().is_lit("--color"));
        assert_eq!(scanner.next_token(Mode::Argument).unwrap().token_type, TokenType::Eof);
    }

    #[test]
    fn test_alias_not_in_argument_position() {
        let mut table = HashMap::new();
        table.insert("ll".to_string(), "ls -l".to_string());
        let mut session = Session::new("t", "ll");
        let mut scanner = Scanner::new(&mut session, Some(&table));
        assert!(scanner.next_token(Mode::Argument).unwrap().is_lit("ll"));
    }

    #[test]
    fn test_command_name_mode() {
        let mut table = HashMap::new();
        table.insert("ll".to_string(), "ls -l".to_string());
        let mut session = Session::new("t", "ll");
        let mut scanner = Scanner::new(&mut session, Some(&table));
        assert!(scanner.next_token(Mode::CommandName).unwrap().is_lit("ls"));
        assert_eq!(types("if", Mode::CommandName)[0], TokenType::Word);
        assert_eq!(types("((x))", Mode::CommandName)[0], TokenType::LParen);
    }

    #[test]
    fn test_alias_trailing_blank_chains() {
        let mut table = HashMap::new();
        table.insert("sudo".to_string(), "sudo ".to_string());
        table.insert("ll".to_string(), "ls -l".to_string());
        let mut session = Session::new("t", "sudo ll");
        let mut scanner = Scanner::new(&mut session, Some(&table));
        assert!(scanner.next_token(Mode::Command).unwrap().is_lit("sudo"));
        assert!(scanner.next_token(Mode::Argument).unwrap().is_lit("ls"));
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("foo_1"));
        assert!(is_valid_name("_x"));
        assert!(!is_valid_name("1x"));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name(""));
    }
}
