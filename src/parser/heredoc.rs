//! Here-Documents
//!
//! `<<` and `<<-` only register the delimiter. Bodies are read once the
//! line holding the operators ends, in the order the operators appeared,
//! and stored in the session under an id the redirection also carries.
//! After each complete command the parser walks the new tree and moves every
//! resolved body onto its redirection. The delimiter line must match
//! exactly, for `<<-` too.

use crate::ast::types::{
    Cmd, CmdExpr, Command, ElsePart, ParamExp, ParamOp, Pipeline, Position, Redir, Word, WordPart,
    AST,
};
use crate::parser::lexer::{Scanner, WordBuilder};
use crate::parser::types::ParseError;
use log::debug;
use std::collections::HashMap;

/// A here-document whose body has not been read yet.
#[derive(Debug, Clone)]
pub struct PendingHeredoc {
    id: usize,
    op_pos: Position,
    /// The delimiter with quoting removed
    text: String,
    /// Quoting in the delimiter turns off expansion in the body
    quoted: bool,
}

/// A here-document body and the line that ended it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeredocDoc {
    pub delim: Word,
    pub body: Word,
}

/// The delimiter text of `word` with quoting removed. Substitutions cannot
/// be part of a delimiter.
fn delimiter_text(word: &Word) -> Option<String> {
    let mut out = String::new();
    for part in &word.parts {
        match part {
            WordPart::Lit(lit) => out.push_str(&lit.value),
            WordPart::Quote(q) => out.push_str(&delimiter_text(&q.word)?),
            WordPart::ParamExp(pe) => out.push_str(&param_text(pe)?),
            WordPart::CmdSubst(_) | WordPart::ArithExp(_) => return None,
        }
    }
    Some(out)
}

/// Parameter expansions in a delimiter are taken literally.
fn param_text(pe: &ParamExp) -> Option<String> {
    if !pe.braces {
        return Some(format!("${}", pe.name.value));
    }
    let operand = match &pe.word {
        Some(word) => delimiter_text(word)?,
        None => String::new(),
    };
    Some(match pe.op {
        ParamOp::Length => format!("${{#{}}}", pe.name.value),
        op => format!("${{{}{}{}}}", pe.name.value, op.as_str(), operand),
    })
}

impl<'a> Scanner<'a> {
    /// Queue a here-document for the redirection at `op_pos`, returning the
    /// id its body will be stored under.
    pub fn push_heredoc(
        &mut self,
        op_pos: Position,
        delim: &Word,
    ) -> Result<usize, ParseError> {
        let Some(text) = delimiter_text(delim) else {
            return Err(ParseError::invalid(
                self.name(),
                delim.pos,
                "invalid here-document delimiter",
            ));
        };
        if text.contains('\n') {
            return Err(ParseError::invalid(
                self.name(),
                delim.pos,
                "heredoc delimiter contains a newline",
            ));
        }
        let id = self.session().next_heredoc;
        self.session().next_heredoc += 1;
        self.pending_heredocs().push_back(PendingHeredoc {
            id,
            op_pos,
            text,
            quoted: delim.is_quoted(),
        });
        Ok(id)
    }

    /// Read the bodies of every queued here-document, in queue order.
    pub(crate) fn scan_heredoc_bodies(&mut self) -> Result<(), ParseError> {
        while let Some(doc) = self.pending_heredocs().pop_front() {
            let resolved = self.scan_heredoc_body(&doc)?;
            debug!(
                "here-document at {} delimited by {:?} at {}",
                doc.op_pos, doc.text, resolved.delim.pos
            );
            self.session().heredocs.insert(doc.id, resolved);
        }
        Ok(())
    }

    fn scan_heredoc_body(&mut self, doc: &PendingHeredoc) -> Result<HeredocDoc, ParseError> {
        let mut wb = WordBuilder::new(self.pos());
        loop {
            if self.cursor().at_eof() {
                return Err(ParseError::unterminated(
                    self.name(),
                    doc.op_pos,
                    "here-document delimited by EOF",
                ));
            }
            // exact, even for `<<-`: its tabs are stripped by the consumer
            let line = self.cursor().peek_line();
            if line == doc.text {
                let delim_pos = self.pos();
                for _ in line.chars() {
                    self.read();
                }
                if self.peek() == Some('\n') {
                    self.read();
                }
                return Ok(HeredocDoc {
                    delim: AST::lit_word(delim_pos, line),
                    body: wb.finish(),
                });
            }
            if doc.quoted {
                self.scan_raw_line(&mut wb);
            } else {
                self.scan_expanding_line(&mut wb)?;
            }
        }
    }

    fn scan_raw_line(&mut self, wb: &mut WordBuilder) {
        loop {
            let at = self.pos();
            match self.read() {
                None => break,
                Some(c) => {
                    wb.push_char(c, at);
                    if c == '\n' {
                        break;
                    }
                }
            }
        }
    }

    /// One body line with `\`, `$` and backticks processed as inside
    /// double quotes, except that `"` is ordinary.
    fn scan_expanding_line(&mut self, wb: &mut WordBuilder) -> Result<(), ParseError> {
        loop {
            let at = self.pos();
            match self.read() {
                None => break,
                Some('\n') => {
                    wb.push_char('\n', at);
                    break;
                }
                Some('\\') => {
                    if !self.scan_quoted_escape(wb, at, "$`\\") {
                        wb.push_char('\\', at);
                    }
                }
                Some('$') => self.scan_dollar(wb, at, true)?,
                Some('`') => {
                    let part = self.scan_cmd_subst(at, true)?;
                    wb.push_part(part);
                }
                Some(c) => wb.push_char(c, at),
            }
        }
        Ok(())
    }
}

// ===========================================================================
// ATTACHING BODIES
// ===========================================================================

/// Move resolved bodies from `docs` onto the matching redirections in
/// `commands`, including those inside substitutions.
pub fn attach_heredocs(commands: &mut [Command], docs: &mut HashMap<usize, HeredocDoc>) {
    for command in commands {
        if docs.is_empty() {
            return;
        }
        walk_command(command, docs);
    }
}

fn walk_command(command: &mut Command, docs: &mut HashMap<usize, HeredocDoc>) {
    match command {
        Command::List(list) => {
            for item in &mut list.items {
                walk_pipeline(&mut item.first, docs);
                for rest in &mut item.rest {
                    walk_pipeline(&mut rest.pipeline, docs);
                }
            }
        }
        Command::AndOr(and_or) => {
            walk_pipeline(&mut and_or.first, docs);
            for rest in &mut and_or.rest {
                walk_pipeline(&mut rest.pipeline, docs);
            }
        }
        Command::Pipeline(pipeline) => walk_pipeline(pipeline, docs),
        Command::Cmd(cmd) => walk_cmd(cmd, docs),
    }
}

fn walk_pipeline(pipeline: &mut Pipeline, docs: &mut HashMap<usize, HeredocDoc>) {
    for cmd in &mut pipeline.cmds {
        walk_cmd(cmd, docs);
    }
}

fn walk_opt(command: &mut Option<Box<Command>>, docs: &mut HashMap<usize, HeredocDoc>) {
    if let Some(command) = command {
        walk_command(command, docs);
    }
}

fn walk_cmd(cmd: &mut Cmd, docs: &mut HashMap<usize, HeredocDoc>) {
    match &mut cmd.expr {
        CmdExpr::Simple(simple) => {
            for assign in &mut simple.assigns {
                walk_word(&mut assign.value, docs);
            }
            for arg in &mut simple.args {
                walk_word(arg, docs);
            }
        }
        CmdExpr::Subshell(sub) => walk_command(&mut sub.list, docs),
        CmdExpr::Group(group) => walk_command(&mut group.list, docs),
        CmdExpr::ArithEval(arith) => walk_word(&mut arith.expr, docs),
        CmdExpr::For(clause) => {
            for item in clause.items.iter_mut().flatten() {
                walk_word(item, docs);
            }
            walk_command(&mut clause.body, docs);
        }
        CmdExpr::Case(clause) => {
            walk_word(&mut clause.word, docs);
            for item in &mut clause.items {
                for pattern in &mut item.patterns {
                    walk_word(pattern, docs);
                }
                walk_opt(&mut item.body, docs);
            }
        }
        CmdExpr::If(clause) => {
            walk_command(&mut clause.cond, docs);
            walk_command(&mut clause.body, docs);
            for part in &mut clause.else_parts {
                match part {
                    ElsePart::Elif(elif) => {
                        walk_command(&mut elif.cond, docs);
                        walk_command(&mut elif.body, docs);
                    }
                    ElsePart::Else(other) => walk_command(&mut other.body, docs),
                }
            }
        }
        CmdExpr::While(clause) => {
            walk_command(&mut clause.cond, docs);
            walk_command(&mut clause.body, docs);
        }
        CmdExpr::Until(clause) => {
            walk_command(&mut clause.cond, docs);
            walk_command(&mut clause.body, docs);
        }
        CmdExpr::FuncDef(def) => walk_cmd(&mut def.body, docs),
    }
    for redir in &mut cmd.redirs {
        walk_redir(redir, docs);
    }
}

fn walk_redir(redir: &mut Redir, docs: &mut HashMap<usize, HeredocDoc>) {
    walk_word(&mut redir.target, docs);
    if redir.hdoc_body.is_none() {
        if let Some(doc) = redir.hdoc_id.and_then(|id| docs.remove(&id)) {
            redir.hdoc_delim = Some(doc.delim);
            redir.hdoc_body = Some(doc.body);
        }
    }
}

fn walk_word(word: &mut Word, docs: &mut HashMap<usize, HeredocDoc>) {
    for part in &mut word.parts {
        match part {
            WordPart::Lit(_) => {}
            WordPart::Quote(q) => walk_word(&mut q.word, docs),
            WordPart::ParamExp(pe) => {
                if let Some(word) = &mut pe.word {
                    walk_word(word, docs);
                }
            }
            WordPart::CmdSubst(cs) => attach_heredocs(&mut cs.commands, docs),
            WordPart::ArithExp(ae) => walk_word(&mut ae.expr, docs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::{Mode, TokenType};
    use crate::parser::source::Session;
    use crate::parser::types::ErrorKind;

    fn delim(src: &str) -> Word {
        let mut session = Session::new("t", src);
        let mut scanner = Scanner::new(&mut session, None);
        scanner.next_token(Mode::Argument).unwrap().word.unwrap()
    }

    /// Register `delim` as a heredoc at 1:1, then scan `rest` to the first
    /// newline and return the resolved document.
    fn resolve(delim_src: &str, rest: &str) -> Result<HeredocDoc, ParseError> {
        let word = delim(delim_src);
        let mut session = Session::new("t", rest);
        let id = {
            let mut scanner = Scanner::new(&mut session, None);
            let id = scanner.push_heredoc(Position::new(1, 1), &word)?;
            loop {
                let tok = scanner.next_token(Mode::Argument)?;
                if matches!(tok.token_type, TokenType::Newline | TokenType::Eof) {
                    break id;
                }
            }
        };
        Ok(session.heredocs.remove(&id).unwrap())
    }

    #[test]
    fn test_delimiter_text() {
        assert_eq!(delimiter_text(&delim("EOF")).as_deref(), Some("EOF"));
        assert_eq!(delimiter_text(&delim("'E'OF")).as_deref(), Some("EOF"));
        assert_eq!(delimiter_text(&delim("\\EOF")).as_deref(), Some("EOF"));
        assert_eq!(delimiter_text(&delim("$x")).as_deref(), Some("$x"));
        assert_eq!(delimiter_text(&delim("$(x)")), None);
    }

    #[test]
    fn test_unquoted_body_expands() {
        let doc = resolve("EOF", "\nhello $name\n\\$x \"q\"\nEOF\n").unwrap();
        let body = &doc.body;
        assert!(matches!(&body.parts[1], WordPart::ParamExp(p) if p.name.value == "name"));
        assert_eq!(body.lit_value(), "hello \n$x \"q\"\n");
        assert_eq!(doc.delim.as_lit(), Some("EOF"));
        assert_eq!(doc.delim.pos, Position::new(4, 1));
    }

    #[test]
    fn test_quoted_body_is_raw() {
        let doc = resolve("'EOF'", "\n$a `b` \\c\nEOF").unwrap();
        assert_eq!(doc.body.parts.len(), 1);
        assert_eq!(doc.body.as_lit(), Some("$a `b` \\c\n"));
    }

    #[test]
    fn test_delimiter_line_must_match_exactly() {
        let doc = resolve("END", "\n\tline\n\tEND\nEND\n").unwrap();
        assert_eq!(doc.body.lit_value(), "\tline\n\tEND\n");
        assert_eq!(doc.delim.lit_value(), "END");
        assert_eq!(doc.delim.pos, Position::new(4, 1));

        let err = resolve("END", "\n\t\tEND\n").unwrap_err();
        assert_eq!(err.message, "here-document delimited by EOF");
    }

    #[test]
    fn test_delimited_by_eof() {
        let err = resolve("EOF", "\nno end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unterminated);
        assert_eq!(err.pos, Position::new(1, 1));
    }

    #[test]
    fn test_empty_body() {
        let doc = resolve("EOF", "\nEOF\n").unwrap();
        assert!(doc.body.parts.is_empty());
    }

    #[test]
    fn test_newline_in_delimiter() {
        let word = delim("'a\nb'");
        let mut session = Session::new("t", "");
        let mut scanner = Scanner::new(&mut session, None);
        let err = scanner.push_heredoc(Position::new(1, 1), &word).unwrap_err();
        assert_eq!(err.message, "heredoc delimiter contains a newline");
    }
}
