//! Node extents
//!
//! Every node reports where it starts and where it ends. `end()` is
//! exclusive: it points just past the last character of the node.

use crate::ast::types::*;

pub trait Node {
    fn start(&self) -> Position;
    fn end(&self) -> Position;
}

/// Earliest valid position of the two, ignoring zero values.
fn first_of(a: Position, b: Position) -> Position {
    match (a.is_valid(), b.is_valid()) {
        (true, true) => a.min(b),
        (true, false) => a,
        _ => b,
    }
}

fn last_of(a: Position, b: Position) -> Position {
    match (a.is_valid(), b.is_valid()) {
        (true, true) => a.max(b),
        (true, false) => a,
        _ => b,
    }
}

impl Node for Comment {
    fn start(&self) -> Position {
        self.hash
    }
    fn end(&self) -> Position {
        self.hash.shift(1).advance(&self.text)
    }
}

impl Node for Lit {
    fn start(&self) -> Position {
        self.pos
    }
    fn end(&self) -> Position {
        self.pos.advance(&self.value)
    }
}

impl Node for Word {
    fn start(&self) -> Position {
        self.parts.first().map_or(self.pos, Node::start)
    }
    fn end(&self) -> Position {
        self.parts.last().map_or(self.pos, Node::end)
    }
}

impl Node for WordPart {
    fn start(&self) -> Position {
        match self {
            WordPart::Lit(p) => p.start(),
            WordPart::Quote(p) => p.start(),
            WordPart::ParamExp(p) => p.start(),
            WordPart::CmdSubst(p) => p.start(),
            WordPart::ArithExp(p) => p.start(),
        }
    }
    fn end(&self) -> Position {
        match self {
            WordPart::Lit(p) => p.end(),
            WordPart::Quote(p) => p.end(),
            WordPart::ParamExp(p) => p.end(),
            WordPart::CmdSubst(p) => p.end(),
            WordPart::ArithExp(p) => p.end(),
        }
    }
}

impl Node for Quote {
    fn start(&self) -> Position {
        self.pos
    }
    fn end(&self) -> Position {
        match self.kind {
            QuoteKind::Backslash if self.word.parts.is_empty() => self.pos.shift(1),
            QuoteKind::Backslash => self.word.end(),
            QuoteKind::Single | QuoteKind::Double => self.close.shift(1),
        }
    }
}

impl Node for ParamExp {
    fn start(&self) -> Position {
        self.dollar
    }
    fn end(&self) -> Position {
        if self.braces {
            self.rbrace.shift(1)
        } else {
            self.name.end()
        }
    }
}

impl Node for CmdSubst {
    fn start(&self) -> Position {
        self.left
    }
    fn end(&self) -> Position {
        self.right
    }
}

impl Node for ArithExp {
    fn start(&self) -> Position {
        self.left
    }
    fn end(&self) -> Position {
        self.right.shift(2)
    }
}

impl Node for Command {
    fn start(&self) -> Position {
        match self {
            Command::List(c) => c.start(),
            Command::AndOr(c) => c.start(),
            Command::Pipeline(c) => c.start(),
            Command::Cmd(c) => c.start(),
        }
    }
    fn end(&self) -> Position {
        match self {
            Command::List(c) => c.end(),
            Command::AndOr(c) => c.end(),
            Command::Pipeline(c) => c.end(),
            Command::Cmd(c) => c.end(),
        }
    }
}

impl Node for List {
    fn start(&self) -> Position {
        self.items.first().map_or_else(Position::default, Node::start)
    }
    fn end(&self) -> Position {
        self.items.last().map_or_else(Position::default, Node::end)
    }
}

impl Node for AndOrList {
    fn start(&self) -> Position {
        self.first.start()
    }
    fn end(&self) -> Position {
        if let Some(sep) = &self.sep {
            return sep.pos.shift(1);
        }
        self.rest
            .last()
            .map_or_else(|| self.first.end(), |item| item.pipeline.end())
    }
}

impl Node for Pipeline {
    fn start(&self) -> Position {
        let first = self.cmds.first().map_or_else(Position::default, Node::start);
        match self.bang {
            Some(bang) => first_of(bang, first),
            None => first,
        }
    }
    fn end(&self) -> Position {
        self.cmds.last().map_or_else(Position::default, Node::end)
    }
}

impl Node for Cmd {
    fn start(&self) -> Position {
        let redir = self.redirs.first().map_or_else(Position::default, Node::start);
        first_of(self.expr.start(), redir)
    }
    fn end(&self) -> Position {
        let redir = self.redirs.last().map_or_else(Position::default, Node::end);
        last_of(self.expr.end(), redir)
    }
}

impl Node for CmdExpr {
    fn start(&self) -> Position {
        match self {
            CmdExpr::Simple(c) => c.start(),
            CmdExpr::Subshell(c) => c.lparen,
            CmdExpr::Group(c) => c.lbrace,
            CmdExpr::ArithEval(c) => c.left,
            CmdExpr::For(c) => c.for_pos,
            CmdExpr::Case(c) => c.case_pos,
            CmdExpr::If(c) => c.if_pos,
            CmdExpr::While(c) => c.while_pos,
            CmdExpr::Until(c) => c.until_pos,
            CmdExpr::FuncDef(c) => c.name.start(),
        }
    }
    fn end(&self) -> Position {
        match self {
            CmdExpr::Simple(c) => c.end(),
            CmdExpr::Subshell(c) => c.rparen.shift(1),
            CmdExpr::Group(c) => c.rbrace.shift(1),
            CmdExpr::ArithEval(c) => c.right.shift(2),
            CmdExpr::For(c) => c.done_pos.shift(4),
            CmdExpr::Case(c) => c.esac_pos.shift(4),
            CmdExpr::If(c) => c.fi_pos.shift(2),
            CmdExpr::While(c) => c.done_pos.shift(4),
            CmdExpr::Until(c) => c.done_pos.shift(4),
            CmdExpr::FuncDef(c) => c.body.end(),
        }
    }
}

impl Node for SimpleCmd {
    fn start(&self) -> Position {
        match (self.assigns.first(), self.args.first()) {
            (Some(a), _) => a.start(),
            (None, Some(w)) => w.start(),
            (None, None) => Position::default(),
        }
    }
    fn end(&self) -> Position {
        match (self.args.last(), self.assigns.last()) {
            (Some(w), _) => w.end(),
            (None, Some(a)) => a.end(),
            (None, None) => Position::default(),
        }
    }
}

impl Node for CaseItem {
    fn start(&self) -> Position {
        self.patterns.first().map_or(self.rparen, Node::start)
    }
    fn end(&self) -> Position {
        if self.op_pos.is_valid() {
            return self.op_pos.shift(2);
        }
        match &self.body {
            Some(body) => body.end(),
            None => self.rparen.shift(1),
        }
    }
}

impl Node for Assign {
    fn start(&self) -> Position {
        self.name.start()
    }
    fn end(&self) -> Position {
        self.value.end()
    }
}

impl Node for Redir {
    fn start(&self) -> Position {
        self.fd.as_ref().map_or(self.op_pos, Node::start)
    }
    fn end(&self) -> Position {
        self.target.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_end_crosses_newlines() {
        let lit = AST::lit(Position::new(1, 5), "ab\ncd");
        assert_eq!(lit.end(), Position::new(2, 3));
    }

    #[test]
    fn test_empty_word_end_is_pos() {
        let word = AST::word(Position::new(3, 7), vec![]);
        assert_eq!(word.start(), Position::new(3, 7));
        assert_eq!(word.end(), Position::new(3, 7));
    }

    #[test]
    fn test_quote_ends_after_closing_quote() {
        let inner = AST::lit_word(Position::new(1, 2), "abc");
        let quote = AST::quoted(Position::new(1, 1), QuoteKind::Single, inner, Position::new(1, 5));
        assert_eq!(quote.end(), Position::new(1, 6));
    }

    #[test]
    fn test_escaped_eof_has_width_one() {
        let quote = AST::quote(Position::new(1, 4), QuoteKind::Backslash, Word::default());
        assert_eq!(quote.end(), Position::new(1, 5));
    }

    #[test]
    fn test_position_ordering() {
        let a = Position::new(1, 9);
        let b = Position::new(2, 1);
        assert!(a.before(b));
        assert!(b.after(a));
        assert!(!Position::default().is_valid());
    }

    #[test]
    fn test_cmd_spans_leading_redirection() {
        let target = AST::lit_word(Position::new(1, 2), "out");
        let redir = AST::redirection(None, Position::new(1, 1), RedirOp::Great, target);
        let cmd = AST::simple_command(vec![], vec![AST::lit_word(Position::new(1, 6), "echo")], vec![redir]);
        assert_eq!(cmd.start(), Position::new(1, 1));
        assert_eq!(cmd.end(), Position::new(1, 10));
    }
}
