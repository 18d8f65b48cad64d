//! Syntax Tree Types for the POSIX Shell Command Language
//!
//! This module defines the tree produced by the scanner/grammar pair.
//! Every node carries the positions needed to compute its extent; the
//! `Node` impls in `ast::node` derive `start()` and `end()` from them.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// BASE TYPES
// =============================================================================

/// A 1-based (line, column) location. The zero value means "no position".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Whether this is a real position rather than the zero value.
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }

    pub fn before(&self, other: Position) -> bool {
        *self < other
    }

    pub fn after(&self, other: Position) -> bool {
        *self > other
    }

    /// The position `n` columns to the right on the same line.
    pub fn shift(self, n: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + n,
        }
    }

    /// The position just past `text` when it starts here.
    pub fn advance(self, text: &str) -> Self {
        let mut pos = self;
        for c in text.chars() {
            if c == '\n' {
                pos.line += 1;
                pos.column = 1;
            } else {
                pos.column += 1;
            }
        }
        pos
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Root node: everything parsed from one source.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct File {
    pub name: String,
    pub commands: Vec<Command>,
    pub comments: Vec<Comment>,
}

/// `# text` up to, not including, the end of the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub hash: Position,
    pub text: String,
}

// =============================================================================
// LISTS, AND-OR LISTS & PIPELINES
// =============================================================================

/// A command in its simplest form. The grammar unwraps trivial wrappers:
/// a one-item list is its and-or list, an and-or list with one pipeline and
/// no separator is that pipeline, and a pipeline without `!` holding a
/// single command is that command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    List(List),
    AndOr(AndOrList),
    Pipeline(Pipeline),
    Cmd(Cmd),
}

/// Two or more and-or lists joined by `;`, `&` or newlines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub items: Vec<AndOrList>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndOrList {
    pub first: Pipeline,
    pub rest: Vec<AndOrItem>,
    /// Trailing `;` or `&`, patched in once the terminator is seen.
    pub sep: Option<Separator>,
}

/// `&& pipeline` or `|| pipeline`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AndOrItem {
    pub op_pos: Position,
    pub op: AndOrOp,
    pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AndOrOp {
    And, // &&
    Or,  // ||
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Separator {
    pub pos: Position,
    pub op: SeparatorOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeparatorOp {
    Semi, // ;
    Amp,  // &
}

/// `[!] cmd | cmd | ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipeline {
    pub bang: Option<Position>,
    pub cmds: Vec<Cmd>,
}

// =============================================================================
// COMMANDS
// =============================================================================

/// A command expression plus the redirections that follow it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cmd {
    pub expr: CmdExpr,
    pub redirs: Vec<Redir>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CmdExpr {
    Simple(SimpleCmd),
    Subshell(Subshell),
    Group(Group),
    ArithEval(ArithEval),
    For(ForClause),
    Case(CaseClause),
    If(IfClause),
    While(WhileClause),
    Until(UntilClause),
    FuncDef(FuncDef),
}

/// `NAME=value ... word ...`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SimpleCmd {
    pub assigns: Vec<Assign>,
    pub args: Vec<Word>,
}

/// `( list )`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subshell {
    pub lparen: Position,
    pub rparen: Position,
    pub list: Box<Command>,
}

/// `{ list; }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub lbrace: Position,
    pub rbrace: Position,
    pub list: Box<Command>,
}

/// `(( expr ))`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArithEval {
    pub left: Position,
    pub right: Position,
    pub expr: Word,
}

/// `for name [in items]; do body; done`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForClause {
    pub for_pos: Position,
    pub name: Lit,
    /// None iterates over the positional parameters; `Some(vec![])` is an
    /// explicit empty `in` list.
    pub items: Option<Vec<Word>>,
    pub do_pos: Position,
    pub done_pos: Position,
    pub body: Box<Command>,
}

/// `case word in items esac`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseClause {
    pub case_pos: Position,
    pub word: Word,
    pub items: Vec<CaseItem>,
    pub esac_pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseItem {
    pub patterns: Vec<Word>,
    pub rparen: Position,
    pub body: Option<Box<Command>>,
    /// Position of `;;` or `;&`, zero for a last item closed by `esac`.
    pub op_pos: Position,
    /// Terminated by `;&` rather than `;;`
    pub fallthrough: bool,
}

/// `if cond; then body; [elif ...;] [else ...;] fi`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfClause {
    pub if_pos: Position,
    pub cond: Box<Command>,
    pub then_pos: Position,
    pub body: Box<Command>,
    pub else_parts: Vec<ElsePart>,
    pub fi_pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ElsePart {
    Elif(ElifClause),
    Else(ElseClause),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElifClause {
    pub elif_pos: Position,
    pub cond: Box<Command>,
    pub then_pos: Position,
    pub body: Box<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElseClause {
    pub else_pos: Position,
    pub body: Box<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileClause {
    pub while_pos: Position,
    pub cond: Box<Command>,
    pub do_pos: Position,
    pub body: Box<Command>,
    pub done_pos: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UntilClause {
    pub until_pos: Position,
    pub cond: Box<Command>,
    pub do_pos: Position,
    pub body: Box<Command>,
    pub done_pos: Position,
}

/// `name() compound-command`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncDef {
    pub name: Lit,
    pub body: Box<Cmd>,
}

// =============================================================================
// ASSIGNMENTS & REDIRECTIONS
// =============================================================================

/// `NAME=value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assign {
    pub name: Lit,
    pub value: Word,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Redir {
    pub fd: Option<Lit>,
    pub op_pos: Position,
    pub op: RedirOp,
    /// The file word, or the delimiter word as written for heredocs.
    pub target: Word,
    /// The delimiter as found on the closing line.
    pub hdoc_delim: Option<Word>,
    pub hdoc_body: Option<Word>,
    /// Links a heredoc redirection to its body, in the order operators were read.
    #[serde(skip)]
    pub hdoc_id: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RedirOp {
    Less,      // <
    Great,     // >
    Clobber,   // >|
    DGreat,    // >>
    DLess,     // <<
    DLessDash, // <<-
    LessAnd,   // <&
    GreatAnd,  // >&
    LessGreat, // <>
}

impl RedirOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::Great => ">",
            Self::Clobber => ">|",
            Self::DGreat => ">>",
            Self::DLess => "<<",
            Self::DLessDash => "<<-",
            Self::LessAnd => "<&",
            Self::GreatAnd => ">&",
            Self::LessGreat => "<>",
        }
    }

    pub fn is_heredoc(&self) -> bool {
        matches!(self, Self::DLess | Self::DLessDash)
    }
}

impl fmt::Display for RedirOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WORDS (the heart of shell parsing)
// =============================================================================

/// A Word is a sequence of parts that form a single shell word.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Word {
    pub pos: Position,
    pub parts: Vec<WordPart>,
}

impl Word {
    /// The text of a word made of exactly one unquoted literal.
    pub fn as_lit(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [WordPart::Lit(lit)] => Some(&lit.value),
            _ => None,
        }
    }

    /// Whether any part of the word is quoted.
    pub fn is_quoted(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, WordPart::Quote(_)))
    }

    /// Concatenated literal value with quoting removed. Substitutions
    /// contribute nothing.
    pub fn lit_value(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                WordPart::Lit(lit) => out.push_str(&lit.value),
                WordPart::Quote(q) => out.push_str(&q.word.lit_value()),
                _ => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WordPart {
    Lit(Lit),
    Quote(Quote),
    ParamExp(ParamExp),
    CmdSubst(CmdSubst),
    ArithExp(ArithExp),
}

/// Literal text (no special meaning)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lit {
    pub pos: Position,
    pub value: String,
}

/// `\x`, `'...'` or `"..."`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub pos: Position,
    pub kind: QuoteKind,
    pub word: Word,
    /// The closing quote; zero for a backslash.
    pub close: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuoteKind {
    Backslash,
    Single,
    Double,
}

impl QuoteKind {
    pub fn as_char(&self) -> char {
        match self {
            Self::Backslash => '\\',
            Self::Single => '\'',
            Self::Double => '"',
        }
    }
}

// =============================================================================
// SUBSTITUTIONS
// =============================================================================

/// Parameter expansion: `$name` or `${...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamExp {
    pub dollar: Position,
    pub braces: bool,
    pub name: Lit,
    pub op_pos: Position,
    pub op: ParamOp,
    pub word: Option<Word>,
    /// Closing `}`, zero for the unbraced form.
    pub rbrace: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamOp {
    None,
    DefaultUnsetOrNull,   // :-
    DefaultUnset,         // -
    AssignUnsetOrNull,    // :=
    AssignUnset,          // =
    ErrorUnsetOrNull,     // :?
    ErrorUnset,           // ?
    AlternateSetNotNull,  // :+
    AlternateSet,         // +
    Length,               // ${#name}
    RemoveSmallestPrefix, // #
    RemoveLargestPrefix,  // ##
    RemoveSmallestSuffix, // %
    RemoveLargestSuffix,  // %%
}

impl ParamOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::DefaultUnsetOrNull => ":-",
            Self::DefaultUnset => "-",
            Self::AssignUnsetOrNull => ":=",
            Self::AssignUnset => "=",
            Self::ErrorUnsetOrNull => ":?",
            Self::ErrorUnset => "?",
            Self::AlternateSetNotNull => ":+",
            Self::AlternateSet => "+",
            Self::Length | Self::RemoveSmallestPrefix => "#",
            Self::RemoveLargestPrefix => "##",
            Self::RemoveSmallestSuffix => "%",
            Self::RemoveLargestSuffix => "%%",
        }
    }
}

/// `$(...)` or `` `...` ``
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmdSubst {
    /// `$(` rather than a backtick
    pub dollar: bool,
    pub left: Position,
    /// Just past the closing `)` or backtick
    pub right: Position,
    pub commands: Vec<Command>,
}

/// `$(( expr ))`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArithExp {
    pub left: Position,
    /// The closing `))`
    pub right: Position,
    pub expr: Word,
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl Pipeline {
    pub fn into_command(mut self) -> Command {
        if self.bang.is_none() && self.cmds.len() == 1 {
            if let Some(cmd) = self.cmds.pop() {
                return Command::Cmd(cmd);
            }
        }
        Command::Pipeline(self)
    }
}

impl AndOrList {
    pub fn into_command(self) -> Command {
        if self.rest.is_empty() && self.sep.is_none() {
            return self.first.into_command();
        }
        Command::AndOr(self)
    }
}

impl From<Cmd> for Command {
    fn from(cmd: Cmd) -> Self {
        Command::Cmd(cmd)
    }
}

// =============================================================================
// AST BUILDER
// =============================================================================

/// Constructors for the node types the scanner and grammar build most often.
pub struct AST;

impl AST {
    pub fn lit(pos: Position, value: impl Into<String>) -> Lit {
        Lit {
            pos,
            value: value.into(),
        }
    }

    pub fn word(pos: Position, parts: Vec<WordPart>) -> Word {
        Word { pos, parts }
    }

    /// A word holding a single literal.
    pub fn lit_word(pos: Position, value: impl Into<String>) -> Word {
        Word {
            pos,
            parts: vec![WordPart::Lit(Self::lit(pos, value))],
        }
    }

    /// A backslash escape.
    pub fn quote(pos: Position, kind: QuoteKind, word: Word) -> WordPart {
        Self::quoted(pos, kind, word, Position::default())
    }

    /// A quote closed at `close`.
    pub fn quoted(pos: Position, kind: QuoteKind, word: Word, close: Position) -> WordPart {
        WordPart::Quote(Quote {
            pos,
            kind,
            word,
            close,
        })
    }

    pub fn simple_command(assigns: Vec<Assign>, args: Vec<Word>, redirs: Vec<Redir>) -> Cmd {
        Cmd {
            expr: CmdExpr::Simple(SimpleCmd { assigns, args }),
            redirs,
        }
    }

    pub fn pipeline(bang: Option<Position>, cmds: Vec<Cmd>) -> Pipeline {
        Pipeline { bang, cmds }
    }

    pub fn and_or(first: Pipeline, rest: Vec<AndOrItem>) -> AndOrList {
        AndOrList {
            first,
            rest,
            sep: None,
        }
    }

    /// The simplest command for a sequence of and-or lists; None if empty.
    pub fn list(mut items: Vec<AndOrList>) -> Option<Command> {
        match items.len() {
            0 => None,
            1 => items.pop().map(AndOrList::into_command),
            _ => Some(Command::List(List { items })),
        }
    }

    pub fn redirection(fd: Option<Lit>, op_pos: Position, op: RedirOp, target: Word) -> Redir {
        Redir {
            fd,
            op_pos,
            op,
            target,
            hdoc_delim: None,
            hdoc_body: None,
            hdoc_id: None,
        }
    }
}
