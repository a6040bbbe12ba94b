//! Content expressions.
//!
//! A node type's `content` string (`"block+"`, `"heading paragraph*"`,
//! `"(paragraph | blockquote)+"`, ...) is parsed once when the schema is
//! built and compiled into a small NFA over node type indices.

use crate::error::ModelError;

#[derive(Debug, Clone)]
enum Expr {
    Choice(Vec<Expr>),
    Seq(Vec<Expr>),
    Star(Box<Expr>),
    Plus(Box<Expr>),
    Opt(Box<Expr>),
    Name(Vec<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    term: Option<usize>,
    to: usize,
}

/// Compiled content expression.
#[derive(Debug, Clone)]
pub(crate) struct ContentMatch {
    states: Vec<Vec<Edge>>,
    accept: usize,
}

impl ContentMatch {
    /// The expression of leaf types: only the empty sequence matches.
    pub(crate) fn empty() -> Self {
        Self {
            states: vec![Vec::new()],
            accept: 0,
        }
    }

    /// Parse and compile `expr`; `resolve` maps a node or group name to
    /// the node type indices it stands for.
    pub(crate) fn parse(
        expr: &str,
        resolve: &dyn Fn(&str) -> Option<Vec<usize>>,
    ) -> Result<Self, ModelError> {
        let tokens = tokenize(expr);
        if tokens.is_empty() {
            return Ok(Self::empty());
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            source: expr,
            resolve,
        };
        let parsed = parser.parse_expr()?;
        if parser.pos < parser.tokens.len() {
            return Err(parser.err("unexpected trailing input"));
        }

        let mut nfa = Nfa {
            states: vec![Vec::new()],
        };
        let dangling = nfa.compile(&parsed, 0);
        let accept = nfa.node();
        nfa.connect(&dangling, accept);

        let states = nfa
            .states
            .into_iter()
            .map(|edges| {
                edges
                    .into_iter()
                    .filter_map(|(term, to)| to.map(|to| Edge { term, to }))
                    .collect()
            })
            .collect();
        Ok(Self { states, accept })
    }

    /// Whether only the empty sequence is accepted.
    pub(crate) fn is_leaf(&self) -> bool {
        self.states.iter().flatten().all(|e| e.term.is_none())
    }

    /// All node type indices the expression refers to.
    pub(crate) fn referenced(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.states.iter().flatten().filter_map(|e| e.term).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Node types that may appear as the first child.
    pub(crate) fn first_types(&self) -> Vec<usize> {
        let start = self.closure(&[0]);
        let mut out: Vec<usize> = start
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .flat_map(|(s, _)| self.states[s].iter().filter_map(|e| e.term))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Whether the sequence of child type indices is accepted.
    pub(crate) fn matches<I: IntoIterator<Item = usize>>(&self, types: I) -> bool {
        let mut current = self.closure(&[0]);
        for t in types {
            let next: Vec<usize> = current
                .iter()
                .enumerate()
                .filter(|(_, on)| **on)
                .flat_map(|(s, _)| {
                    self.states[s]
                        .iter()
                        .filter(move |e| e.term == Some(t))
                        .map(|e| e.to)
                })
                .collect();
            if next.is_empty() {
                return false;
            }
            current = self.closure(&next);
        }
        current[self.accept]
    }

    fn closure(&self, seeds: &[usize]) -> Vec<bool> {
        let mut on = vec![false; self.states.len()];
        let mut stack: Vec<usize> = seeds.to_vec();
        while let Some(s) = stack.pop() {
            if on[s] {
                continue;
            }
            on[s] = true;
            for edge in &self.states[s] {
                if edge.term.is_none() && !on[edge.to] {
                    stack.push(edge.to);
                }
            }
        }
        on
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn tokenize(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in expr.chars() {
        if is_word_char(c) {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

struct Parser<'a> {
    tokens: Vec<String>,
    pos: usize,
    source: &'a str,
    resolve: &'a dyn Fn(&str) -> Option<Vec<usize>>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn eat(&mut self, tok: &str) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn err(&self, msg: &str) -> ModelError {
        ModelError::InvalidSchema(format!("{msg} in content expression '{}'", self.source))
    }

    fn parse_expr(&mut self) -> Result<Expr, ModelError> {
        let mut exprs = vec![self.parse_seq()?];
        while self.eat("|") {
            exprs.push(self.parse_seq()?);
        }
        Ok(if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::Choice(exprs)
        })
    }

    fn parse_seq(&mut self) -> Result<Expr, ModelError> {
        let mut exprs = Vec::new();
        while !matches!(self.peek(), None | Some(")") | Some("|")) {
            exprs.push(self.parse_subscript()?);
        }
        match exprs.len() {
            0 => Err(self.err("expected expression")),
            1 => Ok(exprs.remove(0)),
            _ => Ok(Expr::Seq(exprs)),
        }
    }

    fn parse_subscript(&mut self) -> Result<Expr, ModelError> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat("*") {
                expr = Expr::Star(Box::new(expr));
            } else if self.eat("+") {
                expr = Expr::Plus(Box::new(expr));
            } else if self.eat("?") {
                expr = Expr::Opt(Box::new(expr));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ModelError> {
        if self.eat("(") {
            let expr = self.parse_expr()?;
            if !self.eat(")") {
                return Err(self.err("missing closing paren"));
            }
            return Ok(expr);
        }
        let Some(tok) = self.peek().map(str::to_string) else {
            return Err(self.err("unexpected end"));
        };
        if !tok.chars().all(is_word_char) {
            return Err(self.err(&format!("unexpected token '{tok}'")));
        }
        let types = (self.resolve)(&tok)
            .ok_or_else(|| self.err(&format!("no node type or group '{tok}'")))?;
        self.pos += 1;
        Ok(Expr::Name(types))
    }
}

// ── NFA construction ──────────────────────────────────────────────────────

type EdgeRef = (usize, usize);

struct Nfa {
    states: Vec<Vec<(Option<usize>, Option<usize>)>>,
}

impl Nfa {
    fn node(&mut self) -> usize {
        self.states.push(Vec::new());
        self.states.len() - 1
    }

    fn edge(&mut self, from: usize, to: Option<usize>, term: Option<usize>) -> EdgeRef {
        self.states[from].push((term, to));
        (from, self.states[from].len() - 1)
    }

    fn connect(&mut self, edges: &[EdgeRef], to: usize) {
        for &(state, idx) in edges {
            self.states[state][idx].1 = Some(to);
        }
    }

    /// Compile `expr` starting at state `from`, returning the edges that
    /// still need a target.
    fn compile(&mut self, expr: &Expr, from: usize) -> Vec<EdgeRef> {
        match expr {
            Expr::Choice(exprs) => {
                let mut out = Vec::new();
                for e in exprs {
                    out.extend(self.compile(e, from));
                }
                out
            }
            Expr::Seq(exprs) => {
                let mut from = from;
                let mut out = Vec::new();
                for (i, e) in exprs.iter().enumerate() {
                    out = self.compile(e, from);
                    if i + 1 < exprs.len() {
                        from = self.node();
                        self.connect(&out, from);
                    }
                }
                out
            }
            Expr::Star(inner) => {
                let lp = self.node();
                self.edge(from, Some(lp), None);
                let body = self.compile(inner, lp);
                self.connect(&body, lp);
                vec![self.edge(lp, None, None)]
            }
            Expr::Plus(inner) => {
                let lp = self.node();
                let first = self.compile(inner, from);
                self.connect(&first, lp);
                let again = self.compile(inner, lp);
                self.connect(&again, lp);
                vec![self.edge(lp, None, None)]
            }
            Expr::Opt(inner) => {
                let mut out = vec![self.edge(from, None, None)];
                out.extend(self.compile(inner, from));
                out
            }
            Expr::Name(types) => types.iter().map(|&t| self.edge(from, None, Some(t))).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 = paragraph, 1 = heading, 2 = text; "block" = paragraph | heading
    fn resolve(name: &str) -> Option<Vec<usize>> {
        match name {
            "paragraph" => Some(vec![0]),
            "heading" => Some(vec![1]),
            "text" => Some(vec![2]),
            "block" => Some(vec![0, 1]),
            _ => None,
        }
    }

    fn compile(expr: &str) -> ContentMatch {
        ContentMatch::parse(expr, &resolve).unwrap()
    }

    #[test]
    fn plus_requires_one() {
        let m = compile("block+");
        assert!(!m.matches([]));
        assert!(m.matches([0]));
        assert!(m.matches([1, 0, 0]));
        assert!(!m.matches([2]));
    }

    #[test]
    fn star_and_sequence() {
        let m = compile("heading paragraph*");
        assert!(m.matches([1]));
        assert!(m.matches([1, 0, 0]));
        assert!(!m.matches([0]));
        assert!(!m.matches([1, 1]));
    }

    #[test]
    fn choice_and_optional() {
        let m = compile("(paragraph | heading)? text*");
        assert!(m.matches([]));
        assert!(m.matches([0, 2, 2]));
        assert!(m.matches([2]));
        assert!(!m.matches([0, 1]));
    }

    #[test]
    fn empty_expression_is_leaf() {
        let m = compile("");
        assert!(m.is_leaf());
        assert!(m.matches([]));
        assert!(!m.matches([0]));
        assert!(!compile("text*").is_leaf());
    }

    #[test]
    fn first_types_follow_epsilon_edges() {
        assert_eq!(compile("heading? paragraph+").first_types(), vec![0, 1]);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = ContentMatch::parse("listing+", &resolve).unwrap_err();
        assert!(matches!(err, ModelError::InvalidSchema(_)));
        assert!(ContentMatch::parse("(block", &resolve).is_err());
    }
}
