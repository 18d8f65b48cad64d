//! Character Source
//!
//! The rune buffer every scanner reads from. A nested scanner spawned for a
//! substitution borrows the same `Session`, so when it returns the parent
//! continues from exactly where the nested scan stopped.
//!
//! Alias substitution pushes the replacement text as a frame on top of the
//! input; frames are read before the underlying text and popped once
//! exhausted. A frame's name stays "active" until it is popped, which is
//! what stops an alias from expanding inside its own replacement.

use crate::ast::types::Position;
use crate::parser::heredoc::HeredocDoc;
use std::collections::HashMap;

/// Alias replacement text being read in place of the input.
#[derive(Debug)]
struct AliasFrame {
    name: String,
    chars: Vec<char>,
    offset: usize,
    /// Where reading resumes once the frame is exhausted.
    resume: Position,
    /// The replacement ended in a blank, so the next word may be an alias too.
    chain: bool,
}

/// Enough state to undo the last `read`.
#[derive(Debug, Clone, Copy)]
struct Step {
    /// Index of the frame the rune came from, None for the input itself.
    frame: Option<usize>,
    pos: Position,
}

/// A rune buffer with one rune of pushback and line/column tracking.
#[derive(Debug)]
pub struct Cursor {
    chars: Vec<char>,
    offset: usize,
    pos: Position,
    last: Option<Step>,
    frames: Vec<AliasFrame>,
    chain_pending: bool,
}

impl Cursor {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            offset: 0,
            pos: Position::new(1, 1),
            last: None,
            frames: Vec::new(),
            chain_pending: false,
        }
    }

    /// Position of the next rune to be read.
    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn read(&mut self) -> Option<char> {
        let (c, frame) = loop {
            let depth = self.frames.len();
            match self.frames.last_mut() {
                Some(top) if top.offset < top.chars.len() => {
                    let c = top.chars[top.offset];
                    top.offset += 1;
                    break (c, Some(depth - 1));
                }
                Some(_) => self.pop_frame(),
                None => {
                    let Some(&c) = self.chars.get(self.offset) else {
                        self.last = None;
                        return None;
                    };
                    self.offset += 1;
                    break (c, None);
                }
            }
        };
        // popping a frame moves the position back to the input
        let at = self.pos;
        self.last = Some(Step { frame, pos: at });
        self.pos = if c == '\n' {
            Position::new(at.line + 1, 1)
        } else {
            at.shift(1)
        };
        Some(c)
    }

    /// Push back the rune returned by the last `read`. Only one rune of
    /// pushback is kept; a second call is a no-op.
    pub fn unread(&mut self) {
        let Some(step) = self.last.take() else {
            return;
        };
        match step.frame {
            Some(idx) => {
                if let Some(frame) = self.frames.get_mut(idx) {
                    frame.offset -= 1;
                }
            }
            None => self.offset -= 1,
        }
        self.pos = step.pos;
    }

    /// The upcoming runes, without consuming them.
    pub fn lookahead(&self) -> impl Iterator<Item = char> + '_ {
        self.frames
            .iter()
            .rev()
            .flat_map(|f| f.chars[f.offset..].iter())
            .chain(self.chars[self.offset..].iter())
            .copied()
    }

    pub fn peek(&self) -> Option<char> {
        self.lookahead().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.lookahead().nth(n)
    }

    pub fn at_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// The rest of the current line, excluding the newline.
    pub fn peek_line(&self) -> String {
        self.lookahead().take_while(|&c| c != '\n').collect()
    }

    /// Start reading `text` in place of the input. Runes read from it are
    /// positioned from `at`; once it is exhausted the position resumes
    /// where it was before the push.
    pub fn push_alias(&mut self, name: &str, text: &str, at: Position, chain: bool) {
        self.frames.push(AliasFrame {
            name: name.to_string(),
            chars: text.chars().collect(),
            offset: 0,
            resume: self.pos,
            chain,
        });
        self.last = None;
        self.pos = at;
    }

    /// Whether `name` is being substituted right now.
    pub fn alias_active(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.name == name)
    }

    /// Whether the alias just finished asked for the next word to be checked
    /// too. Clears the request.
    pub fn take_alias_chain(&mut self) -> bool {
        std::mem::take(&mut self.chain_pending)
    }

    /// Drop every alias frame that has nothing left to read, so a chaining
    /// request is visible before the next token starts.
    pub fn settle(&mut self) {
        let mut popped = false;
        while self.frames.last().is_some_and(|f| f.offset >= f.chars.len()) {
            self.pop_frame();
            popped = true;
        }
        if popped {
            self.last = None;
        }
    }

    fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.pos = frame.resume;
            if frame.chain {
                self.chain_pending = true;
            }
        }
    }
}

/// State shared by the top-level scanner and every nested one.
#[derive(Debug)]
pub struct Session {
    pub name: String,
    pub cursor: Cursor,
    /// Resolved here-documents keyed by the id `push_heredoc` handed out.
    pub heredocs: HashMap<usize, HeredocDoc>,
    /// Id of the next here-document operator.
    pub next_heredoc: usize,
    /// Current nesting of compound commands and substitutions.
    pub depth: usize,
}

impl Session {
    pub fn new(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            cursor: Cursor::new(input),
            heredocs: HashMap::new(),
            next_heredoc: 0,
            depth: 0,
        }
    }
}
