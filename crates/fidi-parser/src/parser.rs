//! Table-driven shift/reduce parser.
//!
//! The [`Parser`] pulls tokens from a [`Lexer`] one at a time and consults
//! the tables in [`grammar`]. Statements are handed to an [`Actions`]
//! implementation the moment they are fully reduced, so a statement that
//! fails halfway never reaches the graph.
//!
//! # Error recovery
//!
//! When the table has no action for the lookahead, the parser reports an
//! E100 diagnostic, pops the stack back to the point between statements,
//! and discards tokens up to and including the next `;` or `]`. After
//! `max_recoveries` such attempts, or if input ends while discarding, it
//! gives up with a [`SyntaxError`] describing the offending token.
//!
//! Until [`QUIET_TOKENS`] tokens have been shifted after a recovery,
//! further errors are recovered from silently and do not count against the
//! budget. A single mistake inside `[...]` thus yields one diagnostic even
//! though resynchronizing on its `;` leaves the closing `]` behind.

use log::{debug, trace};

use fidi_core::{Span, Spanned, Value};

use crate::{
    actions::{Actions, Attribute, EdgeDecl, NodeDecl},
    error::SyntaxError,
    grammar::{self, Action, Rule, State, Terminal},
    lexer::Lexer,
    symbol::{Children, SemanticValue, Symbol},
    tokens::{Token, TokenKind},
};

/// Tokens to shift after a recovery before errors are reported again.
pub const QUIET_TOKENS: usize = 3;

/// Parser tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    max_recoveries: usize,
}

impl ParserConfig {
    pub const DEFAULT_MAX_RECOVERIES: usize = 16;

    pub fn new(max_recoveries: usize) -> Self {
        Self { max_recoveries }
    }

    /// Fail on the first syntax or lexical error.
    pub fn strict() -> Self {
        Self::new(0)
    }

    pub fn max_recoveries(&self) -> usize {
        self.max_recoveries
    }

    pub fn recovers(&self) -> bool {
        self.max_recoveries > 0
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RECOVERIES)
    }
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    config: ParserConfig,
    stack: Vec<Symbol<'src>>,
    recoveries: usize,
    /// Shifts left before errors are reported again.
    quiet: usize,
}

impl<'src> Parser<'src> {
    pub fn new(lexer: Lexer<'src>, config: ParserConfig) -> Self {
        Self {
            lexer,
            config,
            stack: Vec::new(),
            recoveries: 0,
            quiet: 0,
        }
    }

    /// Number of recoveries performed by the last [`parse`](Self::parse).
    pub fn recoveries(&self) -> usize {
        self.recoveries
    }

    /// Parse the whole input, delivering statements to `actions`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] for input that cannot be recovered from under
    /// the configured budget.
    pub fn parse(&mut self, actions: &mut impl Actions) -> Result<(), SyntaxError> {
        self.stack.clear();
        self.recoveries = 0;
        self.quiet = 0;
        self.stack.push(Symbol::new(
            grammar::START,
            SemanticValue::Empty,
            Span::empty(self.lexer.location()),
        ));

        let mut lookahead = self.next_token(actions)?;
        loop {
            let state = self.state();
            let Some(terminal) = Terminal::of(&lookahead) else {
                // `next_token` never yields lexical errors.
                return Err(SyntaxError::internal(lookahead.span(), "error token in lookahead"));
            };

            match grammar::action(state, terminal) {
                Action::Shift(next) => {
                    trace!(state, next; "Shift {lookahead}");
                    self.stack.push(Symbol::shifted(next, lookahead));
                    self.quiet = self.quiet.saturating_sub(1);
                    lookahead = self.next_token(actions)?;
                }
                Action::Reduce(rule) => self.reduce(rule, lookahead.span(), actions)?,
                Action::Accept => {
                    debug!(recoveries = self.recoveries; "Parse accepted");
                    return Ok(());
                }
                Action::Error => lookahead = self.recover(lookahead, actions)?,
            }
        }
    }

    fn state(&self) -> State {
        self.stack.last().map_or(grammar::START, Symbol::state)
    }

    /// Next grammar token. Lexical errors are reported and skipped when
    /// recovery is enabled and fatal otherwise.
    fn next_token(&mut self, actions: &mut impl Actions) -> Result<Token<'src>, SyntaxError> {
        loop {
            let token = self.lexer.next_token();
            let TokenKind::Error(error) = token.kind() else {
                return Ok(token);
            };
            let error = SyntaxError::lexical(&token, error);
            if !self.config.recovers() {
                return Err(error);
            }
            debug!(code:% = error.code(), location:% = token.location(); "Skipping lexical error");
            actions.report(error.to_diagnostic());
        }
    }

    fn recover(
        &mut self,
        offending: Token<'src>,
        actions: &mut impl Actions,
    ) -> Result<Token<'src>, SyntaxError> {
        let error = SyntaxError::unexpected(&offending, grammar::expected(self.state()));
        if offending.is_eof() || !self.config.recovers() {
            return Err(error);
        }

        if self.quiet > 0 {
            trace!(location:% = offending.location(); "Recovering quietly from follow-up error");
        } else if self.recoveries >= self.config.max_recoveries() {
            return Err(error);
        } else {
            self.recoveries += 1;
            debug!(
                attempt = self.recoveries,
                location:% = offending.location();
                "Recovering from syntax error"
            );
            actions.report(error.to_diagnostic());
        }
        self.quiet = QUIET_TOKENS;

        let keep = self
            .stack
            .iter()
            .rposition(|symbol| symbol.state() == grammar::STATEMENTS)
            .map_or(1, |index| index + 1);
        self.stack.truncate(keep);
        if self.state() != grammar::STATEMENTS {
            // The error came before the first statement-list reduction.
            self.reduce(Rule::StmtsEmpty, offending.span(), actions)?;
        }

        let mut token = offending;
        loop {
            match Terminal::of(&token) {
                Some(Terminal::Semicolon | Terminal::RightBracket) => {
                    return self.next_token(actions);
                }
                Some(Terminal::Eof) => return Err(error),
                _ => token = self.next_token(actions)?,
            }
        }
    }

    fn reduce(
        &mut self,
        rule: Rule,
        lookahead: Span,
        actions: &mut impl Actions,
    ) -> Result<(), SyntaxError> {
        let split = self
            .stack
            .len()
            .checked_sub(rule.len())
            .filter(|&at| at > 0)
            .ok_or_else(|| SyntaxError::internal(lookahead, "parser stack underflow"))?;
        let children = self.stack.split_off(split);

        let span = children
            .iter()
            .map(Symbol::span)
            .filter(|span| !span.is_empty())
            .reduce(|acc, span| acc.union(span))
            .unwrap_or_else(|| Span::empty(lookahead.location()));

        let value = Self::semantic_action(rule, Children::new(children, span), span, actions)?;

        let state = self.state();
        let next = grammar::goto(state, rule.lhs()).ok_or_else(|| {
            SyntaxError::internal(span, &format!("no goto for {:?} in state {state}", rule.lhs()))
        })?;
        trace!(rule:?, state, next; "Reduce");
        self.stack.push(Symbol::new(next, value, span));
        Ok(())
    }

    fn semantic_action(
        rule: Rule,
        mut children: Children<'src>,
        span: Span,
        actions: &mut impl Actions,
    ) -> Result<SemanticValue<'src>, SyntaxError> {
        let value = match rule {
            Rule::StmtsEmpty | Rule::StmtsAppend | Rule::StmtEmpty => SemanticValue::Empty,
            Rule::StmtNode => {
                actions.declare_node(children.node_decl()?);
                SemanticValue::Empty
            }
            Rule::StmtEdge => {
                actions.declare_edge(children.edge_decl()?);
                SemanticValue::Empty
            }
            Rule::StmtSetting => {
                actions.set_attribute(children.attribute()?);
                SemanticValue::Empty
            }

            Rule::NodeDecl => {
                children.skip()?;
                let name = children.identifier()?;
                children.skip()?;
                let attributes = children.attributes()?;
                SemanticValue::NodeDecl(NodeDecl {
                    name,
                    attributes,
                    span,
                })
            }
            Rule::AttrListEmpty | Rule::OptsEmpty => SemanticValue::Attributes(Vec::new()),
            Rule::AttrList | Rule::AttrListTrailingComma => {
                SemanticValue::Attributes(children.attributes()?)
            }
            Rule::AttrsOne => SemanticValue::Attributes(vec![children.attribute()?]),
            Rule::AttrsAppend => {
                let mut attributes = children.attributes()?;
                children.skip()?;
                attributes.push(children.attribute()?);
                SemanticValue::Attributes(attributes)
            }
            Rule::OptsAppend => {
                let mut options = children.attributes()?;
                options.push(children.attribute()?);
                SemanticValue::Attributes(options)
            }
            Rule::Attr | Rule::Setting => {
                let key = children.identifier()?;
                children.skip()?;
                let value = children.value()?;
                SemanticValue::Attribute(Attribute { key, value })
            }
            Rule::ValueString | Rule::ValueNumber | Rule::ValueIdent => {
                let value = match children.token()?.into_kind() {
                    TokenKind::String(text) => Value::Str(text),
                    TokenKind::Number(number) => Value::Number(number),
                    TokenKind::Identifier(name) => Value::Ident(name.to_string()),
                    _ => return Err(SyntaxError::internal(span, "expected a value token")),
                };
                SemanticValue::Value(Spanned::new(value, span))
            }

            Rule::EdgeDecl => {
                let (source, target) = children.edge_head()?;
                let options = children.attributes()?;
                let payload = children.payload()?;
                SemanticValue::EdgeDecl(EdgeDecl {
                    source,
                    target,
                    options,
                    payload,
                    span,
                })
            }
            Rule::EdgeHeadExplicit => {
                let source = children.identifier()?;
                children.skip()?;
                let target = children.identifier()?;
                SemanticValue::EdgeHead {
                    source: Some(source),
                    target,
                }
            }
            Rule::EdgeHeadImplicit => {
                children.skip()?;
                let target = children.identifier()?;
                SemanticValue::EdgeHead {
                    source: None,
                    target,
                }
            }
            Rule::PayloadNone => SemanticValue::Payload(None),
            Rule::PayloadSome => {
                let token = children.token()?;
                let opening = token.location();
                let TokenKind::Payload(text) = token.into_kind() else {
                    return Err(SyntaxError::internal(span, "expected a payload token"));
                };
                let start = opening.advance("{");
                let inner = Span::new(start, start.offset() + text.len());
                SemanticValue::Payload(Some(Spanned::new(text.to_string(), inner)))
            }
        };
        Ok(value)
    }
}
