//! Recursive-descent parser for the unambiguous grammar form: `@epsilon`,
//! `@any`, `@empty_set`, character classes, `<ASTART>`/`<AEND>` anchors,
//! postfix `*`/`?`, `+` disjunction, adjacency concatenation, and
//! parentheses. Whitespace between tokens is insignificant; a literal
//! space is written `\ ` or `[ ]`.

use crate::charclass::{CharClass, RangeError};
use crate::regexp::{Anchor, Regexp};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parse error at byte {pos}: unexpected end of expression; expected {expected}")]
    UnexpectedEnd { pos: usize, expected: &'static str },
    #[error("parse error at byte {pos}: unexpected `{found}`; expected {expected}")]
    Unexpected {
        pos: usize,
        found: char,
        expected: &'static str,
    },
    #[error("parse error at byte {pos}: {source}")]
    Range {
        pos: usize,
        #[source]
        source: RangeError,
    },
}

/// Parse a grammar-form expression into a tree.
pub fn parse(input: &str) -> Result<Rc<Regexp>, ParseError> {
    let mut parser = Parser {
        chars: input.char_indices().collect(),
        pos: 0,
        len: input.len(),
    };
    let re = parser.disjunction()?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(re),
        Some((pos, found)) => Err(ParseError::Unexpected {
            pos,
            found,
            expected: "end of expression",
        }),
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn byte_pos(&self) -> usize {
        self.peek().map(|(p, _)| p).unwrap_or(self.len)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), ParseError> {
        match self.bump() {
            Some((_, c)) if c == want => Ok(()),
            Some((pos, found)) => Err(ParseError::Unexpected {
                pos,
                found,
                expected,
            }),
            None => Err(ParseError::UnexpectedEnd {
                pos: self.len,
                expected,
            }),
        }
    }

    /// disjunction := concat ('+' concat)*  (left-associative)
    fn disjunction(&mut self) -> Result<Rc<Regexp>, ParseError> {
        let mut re = self.concatenation()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some((_, '+')) => {
                    self.pos += 1;
                    let rhs = self.concatenation()?;
                    re = Rc::new(Regexp::Disj(re, rhs));
                }
                _ => return Ok(re),
            }
        }
    }

    /// concat := postfix+  (adjacency, left-associative)
    fn concatenation(&mut self) -> Result<Rc<Regexp>, ParseError> {
        let mut re = self.postfix()?;
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some((_, ')' | '+')) => return Ok(re),
                _ => {
                    let rhs = self.postfix()?;
                    re = Rc::new(Regexp::Concat(re, rhs));
                }
            }
        }
    }

    /// postfix := atom ('*' | '?')*
    fn postfix(&mut self) -> Result<Rc<Regexp>, ParseError> {
        let mut re = self.atom()?;
        while let Some((_, c)) = self.peek() {
            match c {
                '*' => {
                    self.pos += 1;
                    re = Rc::new(Regexp::Star(re));
                }
                '?' => {
                    self.pos += 1;
                    re = Rc::new(Regexp::Opt(re));
                }
                _ => break,
            }
        }
        Ok(re)
    }

    fn atom(&mut self) -> Result<Rc<Regexp>, ParseError> {
        self.skip_ws();
        let Some((pos, c)) = self.peek() else {
            return Err(ParseError::UnexpectedEnd {
                pos: self.len,
                expected: "an expression",
            });
        };
        match c {
            '(' => {
                self.pos += 1;
                let re = self.disjunction()?;
                self.skip_ws();
                self.expect(')', "`)`")?;
                Ok(re)
            }
            '[' => self.class(),
            '@' => self.keyword(),
            '<' => self.anchor(),
            '*' | '?' | '+' | ')' | ']' => Err(ParseError::Unexpected {
                pos,
                found: c,
                expected: "an expression",
            }),
            '\\' => {
                self.pos += 1;
                match self.bump() {
                    Some((_, escaped)) => Ok(Rc::new(Regexp::Symbol(escaped))),
                    None => Err(ParseError::UnexpectedEnd {
                        pos: self.len,
                        expected: "an escaped character",
                    }),
                }
            }
            _ => {
                self.pos += 1;
                Ok(Rc::new(Regexp::Symbol(c)))
            }
        }
    }

    /// `[...]` or `[^...]`: single symbols and `a-b` ranges.
    fn class(&mut self) -> Result<Rc<Regexp>, ParseError> {
        self.expect('[', "`[`")?;
        let negated = if matches!(self.peek(), Some((_, '^'))) {
            self.pos += 1;
            true
        } else {
            false
        };
        let mut items: Vec<(char, char)> = Vec::new();
        loop {
            let Some((pos, c)) = self.bump() else {
                return Err(ParseError::UnexpectedEnd {
                    pos: self.len,
                    expected: "`]`",
                });
            };
            match c {
                ']' => break,
                _ => {
                    let lo = self.class_char(c)?;
                    // a trailing `-` right before `]` is a literal dash
                    if matches!(self.peek(), Some((_, '-')))
                        && !matches!(self.chars.get(self.pos + 1), Some((_, ']')) | None)
                    {
                        self.pos += 1;
                        let Some((_, h)) = self.bump() else {
                            return Err(ParseError::UnexpectedEnd {
                                pos: self.len,
                                expected: "a range upper bound",
                            });
                        };
                        let hi = self.class_char(h)?;
                        if lo > hi {
                            return Err(ParseError::Range {
                                pos,
                                source: RangeError { lo, hi },
                            });
                        }
                        items.push((lo, hi));
                    } else {
                        items.push((lo, lo));
                    }
                }
            }
        }
        // bounds were checked above, so the class constructor cannot fail
        let class = CharClass::new(items, negated).map_err(|source| ParseError::Range {
            pos: self.byte_pos(),
            source,
        })?;
        Ok(Rc::new(Regexp::Class(class)))
    }

    fn class_char(&mut self, c: char) -> Result<char, ParseError> {
        if c != '\\' {
            return Ok(c);
        }
        match self.bump() {
            Some((_, escaped)) => Ok(escaped),
            None => Err(ParseError::UnexpectedEnd {
                pos: self.len,
                expected: "an escaped character",
            }),
        }
    }

    /// `@epsilon`, `@any`, `@empty_set`
    fn keyword(&mut self) -> Result<Rc<Regexp>, ParseError> {
        let start = self.byte_pos();
        self.expect('@', "`@`")?;
        let mut word = String::new();
        while let Some((_, c)) = self.peek() {
            if c.is_ascii_alphabetic() || c == '_' {
                word.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        match word.as_str() {
            "epsilon" => Ok(Rc::new(Regexp::Epsilon)),
            "any" => Ok(Rc::new(Regexp::Any)),
            "empty_set" => Ok(Rc::new(Regexp::EmptySet)),
            _ => Err(ParseError::Unexpected {
                pos: start,
                found: '@',
                expected: "`@epsilon`, `@any` or `@empty_set`",
            }),
        }
    }

    /// `<ASTART>` or `<AEND>`
    fn anchor(&mut self) -> Result<Rc<Regexp>, ParseError> {
        let start = self.byte_pos();
        self.expect('<', "`<`")?;
        let mut word = String::new();
        while let Some((_, c)) = self.peek() {
            if c.is_ascii_alphabetic() {
                word.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        self.expect('>', "`>`")?;
        match word.as_str() {
            "ASTART" => Ok(Rc::new(Regexp::Anchor(Anchor::Start))),
            "AEND" => Ok(Rc::new(Regexp::Anchor(Anchor::End))),
            _ => Err(ParseError::Unexpected {
                pos: start,
                found: '<',
                expected: "`<ASTART>` or `<AEND>`",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(input: &str) -> Rc<Regexp> {
        parse(input).unwrap()
    }

    #[test]
    fn atoms() {
        assert_eq!(*ok("a"), Regexp::Symbol('a'));
        assert_eq!(*ok("@epsilon"), Regexp::Epsilon);
        assert_eq!(*ok("@any"), Regexp::Any);
        assert_eq!(*ok("@empty_set"), Regexp::EmptySet);
        assert_eq!(*ok("<ASTART>"), Regexp::Anchor(Anchor::Start));
        assert_eq!(*ok("<AEND>"), Regexp::Anchor(Anchor::End));
        assert_eq!(*ok("\\*"), Regexp::Symbol('*'));
        assert_eq!(*ok("\\ "), Regexp::Symbol(' '));
        assert_eq!(*ok("λ"), Regexp::Symbol('λ'));
    }

    #[test]
    fn operators_and_grouping() {
        assert_eq!(ok("(a b)").to_string(), "(a b)");
        assert_eq!(ok("(a + b)").to_string(), "(a + b)");
        assert_eq!(ok("a*").to_string(), "a*");
        assert_eq!(ok("(a)?").to_string(), "(a)?");
        // adjacency concatenation folds left
        assert_eq!(ok("(abc)").to_string(), "((a b) c)");
        assert_eq!(ok("000").to_string(), "((0 0) 0)");
        // disjunction binds loosest, postfix tightest
        assert_eq!(ok("ab + c*").to_string(), "((a b) + c*)");
        assert_eq!(ok("a*?").to_string(), "(a*)?");
    }

    #[test]
    fn classes() {
        let re = ok("[ab0-9c]");
        let Regexp::Class(cc) = &*re else {
            panic!("expected class, got {re}");
        };
        assert!(!cc.negated());
        assert!(cc.contains('a'));
        assert!(cc.contains('5'));
        assert!(cc.contains('c'));
        assert!(!cc.contains('d'));

        let re = ok("[^ab0-9c]");
        let Regexp::Class(cc) = &*re else {
            panic!("expected class, got {re}");
        };
        assert!(cc.negated());
        assert!(!cc.contains('5'));
        assert!(cc.contains('z'));

        // trailing dash is a literal
        let re = ok("[a-]");
        let Regexp::Class(cc) = &*re else {
            panic!("expected class, got {re}");
        };
        assert!(cc.contains('-'));
        assert!(cc.contains('a'));
    }

    #[test]
    fn inverted_class_range_is_a_range_error() {
        let err = parse("[z-a]").unwrap_err();
        assert!(matches!(
            err,
            ParseError::Range {
                source: RangeError { lo: 'z', hi: 'a' },
                ..
            }
        ));
    }

    #[test]
    fn diagnostics_carry_positions() {
        let err = parse("(a b").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedEnd {
                pos: 4,
                expected: "`)`"
            }
        );

        let err = parse("a)").unwrap_err();
        assert_eq!(
            err,
            ParseError::Unexpected {
                pos: 1,
                found: ')',
                expected: "end of expression"
            }
        );

        let err = parse("*a").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { pos: 0, .. }));

        let err = parse("@anything").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn whitespace_is_insignificant_between_tokens() {
        assert_eq!(ok("( a   b )"), ok("(a b)"));
        assert_eq!(ok("(0 + 1)*"), ok("(0+1)*"));
    }

    #[test]
    fn grammar_form_fixtures_parse() {
        for expr in [
            "([01]*)",
            "(000)",
            "(1*)",
            "(@epsilon + @any)",
            "((a + b)*)",
            "(<ASTART>(a*))",
        ] {
            parse(expr).unwrap();
        }
    }
}
