//! LALR(1) tables for the fidi grammar.
//!
//! ```text
//! stmts       := stmts stmt | ε
//! stmt        := node_decl | edge_decl ';' | setting ';' | ';'
//! node_decl   := '.' IDENT '[' attr_list ']'
//! attr_list   := attrs | attrs ',' | ε
//! attrs       := attrs ',' attr | attr
//! attr        := IDENT '=' value
//! value       := STRING | NUMBER | IDENT
//! edge_decl   := edge_head opts payload_opt
//! edge_head   := IDENT '->' IDENT | '->' IDENT
//! opts        := opts attr | ε
//! payload_opt := PAYLOAD | ε
//! setting     := IDENT '=' value
//! ```
//!
//! States whose items are all complete reduce without looking at the next
//! token ([`default_reduction`]). Every other state only consults
//! [`action`]. Recovery relies on [`STATEMENTS`] being the single state in
//! which a new statement may begin.

use std::fmt;

use crate::tokens::{Token, TokenKind};

pub type State = u8;

/// The start state, before any statement has been read.
pub const START: State = 0;

/// State after `stmts`: between statements.
pub const STATEMENTS: State = 1;

/// Terminal symbols of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminal {
    Dot,
    Identifier,
    String,
    Number,
    Arrow,
    Equals,
    Comma,
    LeftBracket,
    RightBracket,
    Semicolon,
    Payload,
    Eof,
}

impl Terminal {
    pub const ALL: [Terminal; 12] = [
        Terminal::Dot,
        Terminal::Identifier,
        Terminal::String,
        Terminal::Number,
        Terminal::Arrow,
        Terminal::Equals,
        Terminal::Comma,
        Terminal::LeftBracket,
        Terminal::RightBracket,
        Terminal::Semicolon,
        Terminal::Payload,
        Terminal::Eof,
    ];

    /// Classify a token. Lexical error tokens have no terminal.
    pub fn of(token: &Token<'_>) -> Option<Terminal> {
        let terminal = match token.kind() {
            TokenKind::Identifier(_) => Terminal::Identifier,
            TokenKind::String(_) => Terminal::String,
            TokenKind::Number(_) => Terminal::Number,
            TokenKind::Payload(_) => Terminal::Payload,
            TokenKind::Dot => Terminal::Dot,
            TokenKind::Arrow => Terminal::Arrow,
            TokenKind::Equals => Terminal::Equals,
            TokenKind::Comma => Terminal::Comma,
            TokenKind::LeftBracket => Terminal::LeftBracket,
            TokenKind::RightBracket => Terminal::RightBracket,
            TokenKind::Semicolon => Terminal::Semicolon,
            TokenKind::Eof => Terminal::Eof,
            TokenKind::Error(_) => return None,
        };
        Some(terminal)
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Terminal::Dot => "`.`",
            Terminal::Identifier => "identifier",
            Terminal::String => "string",
            Terminal::Number => "number",
            Terminal::Arrow => "`->`",
            Terminal::Equals => "`=`",
            Terminal::Comma => "`,`",
            Terminal::LeftBracket => "`[`",
            Terminal::RightBracket => "`]`",
            Terminal::Semicolon => "`;`",
            Terminal::Payload => "payload",
            Terminal::Eof => "end of input",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonTerminal {
    Stmts,
    Stmt,
    NodeDecl,
    AttrList,
    Attrs,
    Attr,
    Value,
    EdgeDecl,
    EdgeHead,
    Opts,
    PayloadOpt,
    Setting,
}

/// Productions, one variant per alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    StmtsEmpty,
    StmtsAppend,
    StmtNode,
    StmtEdge,
    StmtSetting,
    StmtEmpty,
    NodeDecl,
    AttrListEmpty,
    AttrList,
    AttrListTrailingComma,
    AttrsOne,
    AttrsAppend,
    Attr,
    ValueString,
    ValueNumber,
    ValueIdent,
    EdgeDecl,
    EdgeHeadExplicit,
    EdgeHeadImplicit,
    OptsEmpty,
    OptsAppend,
    PayloadNone,
    PayloadSome,
    Setting,
}

impl Rule {
    pub fn lhs(self) -> NonTerminal {
        match self {
            Rule::StmtsEmpty | Rule::StmtsAppend => NonTerminal::Stmts,
            Rule::StmtNode | Rule::StmtEdge | Rule::StmtSetting | Rule::StmtEmpty => {
                NonTerminal::Stmt
            }
            Rule::NodeDecl => NonTerminal::NodeDecl,
            Rule::AttrListEmpty | Rule::AttrList | Rule::AttrListTrailingComma => {
                NonTerminal::AttrList
            }
            Rule::AttrsOne | Rule::AttrsAppend => NonTerminal::Attrs,
            Rule::Attr => NonTerminal::Attr,
            Rule::ValueString | Rule::ValueNumber | Rule::ValueIdent => NonTerminal::Value,
            Rule::EdgeDecl => NonTerminal::EdgeDecl,
            Rule::EdgeHeadExplicit | Rule::EdgeHeadImplicit => NonTerminal::EdgeHead,
            Rule::OptsEmpty | Rule::OptsAppend => NonTerminal::Opts,
            Rule::PayloadNone | Rule::PayloadSome => NonTerminal::PayloadOpt,
            Rule::Setting => NonTerminal::Setting,
        }
    }

    /// Number of symbols on the right-hand side.
    pub fn len(self) -> usize {
        match self {
            Rule::StmtsEmpty | Rule::AttrListEmpty | Rule::OptsEmpty | Rule::PayloadNone => 0,
            Rule::StmtNode
            | Rule::StmtEmpty
            | Rule::AttrList
            | Rule::AttrsOne
            | Rule::ValueString
            | Rule::ValueNumber
            | Rule::ValueIdent
            | Rule::PayloadSome => 1,
            Rule::StmtsAppend
            | Rule::StmtEdge
            | Rule::StmtSetting
            | Rule::AttrListTrailingComma
            | Rule::EdgeHeadImplicit
            | Rule::OptsAppend => 2,
            Rule::AttrsAppend
            | Rule::Attr
            | Rule::EdgeDecl
            | Rule::EdgeHeadExplicit
            | Rule::Setting => 3,
            Rule::NodeDecl => 5,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(State),
    Reduce(Rule),
    Accept,
    Error,
}

/// Reduction taken in `state` regardless of the lookahead, if any.
pub fn default_reduction(state: State) -> Option<Rule> {
    let rule = match state {
        0 => Rule::StmtsEmpty,
        2 => Rule::StmtEmpty,
        6 => Rule::StmtsAppend,
        7 => Rule::StmtNode,
        10 => Rule::OptsEmpty,
        14 => Rule::EdgeHeadImplicit,
        15 => Rule::StmtEdge,
        16 => Rule::StmtSetting,
        19 => Rule::EdgeHeadExplicit,
        20 => Rule::ValueString,
        21 => Rule::ValueNumber,
        22 => Rule::ValueIdent,
        23 => Rule::Setting,
        25 => Rule::PayloadSome,
        26 => Rule::EdgeDecl,
        27 => Rule::OptsAppend,
        30 => Rule::AttrsOne,
        32 => Rule::NodeDecl,
        34 => Rule::Attr,
        35 => Rule::AttrsAppend,
        _ => return None,
    };
    Some(rule)
}

/// The ACTION table.
pub fn action(state: State, terminal: Terminal) -> Action {
    if let Some(rule) = default_reduction(state) {
        return Action::Reduce(rule);
    }

    use Terminal as T;
    match (state, terminal) {
        // stmts . stmt
        (1, T::Eof) => Action::Accept,
        (1, T::Semicolon) => Action::Shift(2),
        (1, T::Dot) => Action::Shift(3),
        (1, T::Identifier) => Action::Shift(4),
        (1, T::Arrow) => Action::Shift(5),
        // '.' . IDENT
        (3, T::Identifier) => Action::Shift(11),
        // IDENT . '->' IDENT | IDENT . '=' value
        (4, T::Arrow) => Action::Shift(12),
        (4, T::Equals) => Action::Shift(13),
        // '->' . IDENT
        (5, T::Identifier) => Action::Shift(14),
        // edge_decl . ';'
        (8, T::Semicolon) => Action::Shift(15),
        // setting . ';'
        (9, T::Semicolon) => Action::Shift(16),
        // '.' IDENT . '['
        (11, T::LeftBracket) => Action::Shift(18),
        // IDENT '->' . IDENT
        (12, T::Identifier) => Action::Shift(19),
        // IDENT '=' . value
        (13 | 31, T::String) => Action::Shift(20),
        (13 | 31, T::Number) => Action::Shift(21),
        (13 | 31, T::Identifier) => Action::Shift(22),
        // edge_head opts . payload_opt | opts . attr
        (17, T::Identifier) => Action::Shift(24),
        (17, T::Payload) => Action::Shift(25),
        (17, T::Semicolon) => Action::Reduce(Rule::PayloadNone),
        // '[' . attr_list ']'
        (18, T::Identifier) => Action::Shift(24),
        (18, T::RightBracket) => Action::Reduce(Rule::AttrListEmpty),
        // IDENT . '=' value
        (24, T::Equals) => Action::Shift(31),
        // '[' attr_list . ']'
        (28, T::RightBracket) => Action::Shift(32),
        // attrs . | attrs . ',' | attrs . ',' attr
        (29, T::RightBracket) => Action::Reduce(Rule::AttrList),
        (29, T::Comma) => Action::Shift(33),
        // attrs ',' . | attrs ',' . attr
        (33, T::RightBracket) => Action::Reduce(Rule::AttrListTrailingComma),
        (33, T::Identifier) => Action::Shift(24),
        _ => Action::Error,
    }
}

/// The GOTO table, consulted after a reduction.
pub fn goto(state: State, symbol: NonTerminal) -> Option<State> {
    use NonTerminal as N;
    let next = match (state, symbol) {
        (0, N::Stmts) => 1,
        (1, N::Stmt) => 6,
        (1, N::NodeDecl) => 7,
        (1, N::EdgeDecl) => 8,
        (1, N::Setting) => 9,
        (1, N::EdgeHead) => 10,
        (10, N::Opts) => 17,
        (13, N::Value) => 23,
        (17, N::PayloadOpt) => 26,
        (17, N::Attr) => 27,
        (18, N::AttrList) => 28,
        (18, N::Attrs) => 29,
        (18, N::Attr) => 30,
        (31, N::Value) => 34,
        (33, N::Attr) => 35,
        _ => return None,
    };
    Some(next)
}

/// Terminals that would not be an error in `state`.
pub fn expected(state: State) -> Vec<Terminal> {
    Terminal::ALL
        .into_iter()
        .filter(|&terminal| action(state, terminal) != Action::Error)
        .collect()
}
