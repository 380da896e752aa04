//! Conjunctive-normal-form predicates over a record and a literal record.
//!
//! A `Cnf` is an AND of clauses; each clause is an OR of comparisons. Each
//! comparison side names either an attribute of the record under test or an
//! attribute of the literal record. Expressions of the form
//! `(a = 5) AND (b < 'x' OR c > 2.5)` can be parsed against a schema.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::order::{OrderMaker, SortKey};
use crate::schema::{DataType, Schema};
use crate::types::{compare_scalars, Record, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompOp {
    Less,
    Greater,
    Equals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Attribute of the record being tested.
    Record(usize),
    /// Attribute of the literal record.
    Literal(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: Operand,
    pub op: CompOp,
    pub right: Operand,
    pub data_type: DataType,
}

impl Comparison {
    pub fn new(left: Operand, op: CompOp, right: Operand, data_type: DataType) -> Self {
        Self {
            left,
            op,
            right,
            data_type,
        }
    }

    fn value<'a>(operand: Operand, record: &'a Record, literal: &'a Record) -> Option<&'a Scalar> {
        match operand {
            Operand::Record(idx) => record.get(idx),
            Operand::Literal(idx) => literal.get(idx),
        }
    }

    pub fn eval(&self, record: &Record, literal: &Record) -> bool {
        let (Some(l), Some(r)) = (
            Self::value(self.left, record, literal),
            Self::value(self.right, record, literal),
        ) else {
            return false;
        };
        let ord = compare_scalars(l, r);
        match self.op {
            CompOp::Less => ord == Ordering::Less,
            CompOp::Greater => ord == Ordering::Greater,
            CompOp::Equals => ord == Ordering::Equal,
        }
    }

    /// `(record attr, literal attr)` when this is `record.attr = literal.attr`.
    fn equality_with_literal(&self) -> Option<(usize, usize)> {
        if self.op != CompOp::Equals {
            return None;
        }
        match (self.left, self.right) {
            (Operand::Record(r), Operand::Literal(l)) | (Operand::Literal(l), Operand::Record(r)) => {
                Some((r, l))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cnf {
    pub clauses: Vec<Vec<Comparison>>,
}

impl Cnf {
    pub fn new(clauses: Vec<Vec<Comparison>>) -> Self {
        Self { clauses }
    }

    /// True when every clause has at least one satisfied comparison.
    pub fn eval(&self, record: &Record, literal: &Record) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|c| c.eval(record, literal)))
    }

    /// Build the query orders usable for searching a file sorted by `file_order`.
    ///
    /// Walks `file_order` from its first key and keeps each key that is pinned
    /// by a single-comparison clause `attr = literal` of the same type, stopping
    /// at the first key that is not. Returns the record-side order (a prefix of
    /// `file_order`) and the matching literal-side order, or `None` when even the
    /// first key is unconstrained.
    pub fn query_orders(&self, file_order: &OrderMaker) -> Option<(OrderMaker, OrderMaker)> {
        let mut record_side = OrderMaker::default();
        let mut literal_side = OrderMaker::default();
        for key in file_order.keys() {
            let pinned = self.clauses.iter().find_map(|clause| match clause.as_slice() {
                [only] if only.data_type == key.data_type => only
                    .equality_with_literal()
                    .filter(|(r, _)| *r == key.attr)
                    .map(|(_, l)| l),
                _ => None,
            });
            match pinned {
                Some(lit_attr) => {
                    record_side.push(*key);
                    literal_side.push(SortKey::new(lit_attr, key.data_type));
                }
                None => break,
            }
        }
        if record_side.is_empty() {
            None
        } else {
            Some((record_side, literal_side))
        }
    }

    /// Parse a predicate expression against `schema`.
    ///
    /// Returns the predicate and the literal record holding every constant in
    /// the order it appears.
    pub fn parse(schema: &Schema, text: &str) -> Result<(Cnf, Record)> {
        let tokens = tokenize(text)?;
        let mut parser = Parser {
            schema,
            tokens,
            pos: 0,
            literal: Record::default(),
        };
        let cnf = parser.cnf()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::Parse(format!(
                "unexpected trailing input in predicate '{text}'"
            )));
        }
        Ok((cnf, parser.literal))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Op(CompOp),
    Ident(String),
    Number(String),
    Quoted(String),
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                out.push(Token::LParen);
                i += 1;
            }
            ')' => {
                out.push(Token::RParen);
                i += 1;
            }
            '<' => {
                out.push(Token::Op(CompOp::Less));
                i += 1;
            }
            '>' => {
                out.push(Token::Op(CompOp::Greater));
                i += 1;
            }
            '=' => {
                out.push(Token::Op(CompOp::Equals));
                i += 1;
            }
            '\'' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&c| c == '\'')
                    .map(|p| start + p)
                    .ok_or_else(|| Error::Parse("unterminated string literal".into()))?;
                out.push(Token::Quoted(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E' | '-' | '+'))
                {
                    i += 1;
                }
                out.push(Token::Number(chars[start..i].iter().collect()));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "AND" | "and" => out.push(Token::And),
                    "OR" | "or" => out.push(Token::Or),
                    _ => out.push(Token::Ident(word)),
                }
            }
            other => return Err(Error::Parse(format!("unexpected character '{other}'"))),
        }
    }
    Ok(out)
}

enum Side {
    Attr(usize, DataType),
    Const(Token),
}

struct Parser<'a> {
    schema: &'a Schema,
    tokens: Vec<Token>,
    pos: usize,
    literal: Record,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn cnf(&mut self) -> Result<Cnf> {
        let mut clauses = vec![self.clause()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            clauses.push(self.clause()?);
        }
        Ok(Cnf::new(clauses))
    }

    fn clause(&mut self) -> Result<Vec<Comparison>> {
        let parenthesized = self.peek() == Some(&Token::LParen);
        if parenthesized {
            self.pos += 1;
        }
        let mut comps = vec![self.comparison()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            comps.push(self.comparison()?);
        }
        if parenthesized && self.next() != Some(Token::RParen) {
            return Err(Error::Parse("expected ')'".into()));
        }
        Ok(comps)
    }

    fn side(&mut self) -> Result<Side> {
        match self.next() {
            Some(Token::Ident(name)) => {
                let (idx, ty) = self.schema.resolve(&name)?;
                Ok(Side::Attr(idx, ty))
            }
            Some(tok @ (Token::Number(_) | Token::Quoted(_))) => Ok(Side::Const(tok)),
            other => Err(Error::Parse(format!("expected operand, found {other:?}"))),
        }
    }

    fn push_literal(&mut self, tok: Token, data_type: DataType) -> Result<Operand> {
        let text = match tok {
            Token::Number(s) | Token::Quoted(s) => s,
            other => return Err(Error::Parse(format!("not a constant: {other:?}"))),
        };
        self.literal.push(Scalar::parse(&text, data_type)?);
        Ok(Operand::Literal(self.literal.len() - 1))
    }

    fn comparison(&mut self) -> Result<Comparison> {
        let left = self.side()?;
        let op = match self.next() {
            Some(Token::Op(op)) => op,
            other => return Err(Error::Parse(format!("expected operator, found {other:?}"))),
        };
        let right = self.side()?;
        match (left, right) {
            (Side::Attr(l, lt), Side::Attr(r, rt)) => {
                if lt != rt {
                    return Err(Error::Parse(format!(
                        "cannot compare {lt} attribute with {rt} attribute"
                    )));
                }
                Ok(Comparison::new(Operand::Record(l), op, Operand::Record(r), lt))
            }
            (Side::Attr(l, ty), Side::Const(tok)) => {
                let right = self.push_literal(tok, ty)?;
                Ok(Comparison::new(Operand::Record(l), op, right, ty))
            }
            (Side::Const(tok), Side::Attr(r, ty)) => {
                let left = self.push_literal(tok, ty)?;
                Ok(Comparison::new(left, op, Operand::Record(r), ty))
            }
            (Side::Const(_), Side::Const(_)) => {
                Err(Error::Parse("comparison between two constants".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int),
            Field::new("name", DataType::String),
            Field::new("score", DataType::Double),
        ])
    }

    fn row(id: i32, name: &str, score: f64) -> Record {
        Record::new(vec![
            Scalar::Int(id),
            Scalar::Str(name.into()),
            Scalar::Double(score),
        ])
    }

    #[test]
    fn parse_and_eval() {
        let (cnf, lit) = Cnf::parse(&schema(), "(id = 5) AND (name = 'bob' OR score > 1.5)").unwrap();
        assert_eq!(cnf.clauses.len(), 2);
        assert_eq!(
            lit.values,
            vec![Scalar::Int(5), Scalar::Str("bob".into()), Scalar::Double(1.5)]
        );
        assert!(cnf.eval(&row(5, "bob", 0.0), &lit));
        assert!(cnf.eval(&row(5, "al", 2.0), &lit));
        assert!(!cnf.eval(&row(5, "al", 1.0), &lit));
        assert!(!cnf.eval(&row(4, "bob", 9.0), &lit));
    }

    #[test]
    fn constant_on_the_left() {
        let (cnf, lit) = Cnf::parse(&schema(), "3 < id").unwrap();
        assert!(cnf.eval(&row(4, "", 0.0), &lit));
        assert!(!cnf.eval(&row(3, "", 0.0), &lit));
    }

    #[test]
    fn parse_errors() {
        assert!(Cnf::parse(&schema(), "(id = 5").is_err());
        assert!(Cnf::parse(&schema(), "nope = 5").is_err());
        assert!(Cnf::parse(&schema(), "1 = 2").is_err());
        assert!(Cnf::parse(&schema(), "id = 'x'").is_err());
        assert!(Cnf::parse(&schema(), "id = name").is_err());
    }

    #[test]
    fn query_orders_take_the_pinned_prefix() {
        let file_order = OrderMaker::new(vec![
            SortKey::new(0, DataType::Int),
            SortKey::new(1, DataType::String),
            SortKey::new(2, DataType::Double),
        ]);

        let (cnf, _) = Cnf::parse(&schema(), "(name = 'x') AND (id = 1)").unwrap();
        let (rec, lit) = cnf.query_orders(&file_order).unwrap();
        assert_eq!(
            rec.keys(),
            &[SortKey::new(0, DataType::Int), SortKey::new(1, DataType::String)]
        );
        assert_eq!(
            lit.keys(),
            &[SortKey::new(1, DataType::Int), SortKey::new(0, DataType::String)]
        );

        // a range or a disjunction does not pin the key
        let (cnf, _) = Cnf::parse(&schema(), "(id > 1) AND (name = 'x')").unwrap();
        assert!(cnf.query_orders(&file_order).is_none());
        let (cnf, _) = Cnf::parse(&schema(), "(id = 1 OR id = 2)").unwrap();
        assert!(cnf.query_orders(&file_order).is_none());
    }
}
