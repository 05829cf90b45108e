//! Regular expression to NFA constructions and automaton algebra over
//! Unicode character classes.
//!
//! Expressions are trees over literals, character classes, the wildcard,
//! ε, concatenation, disjunction, star, option, and the two boundary
//! anchors. A tree becomes an executable nondeterministic automaton
//! through any of seven constructions (`thompson`, `glushkov`,
//! `position`, `follow`, `pd`, `pdo`, `pddag`), all agreeing on the
//! accepted language. Automata support membership evaluation, product
//! (intersection), dead-state trimming, shortest-word witness search, and
//! shortlex enumeration of the accepted language; the boundary transform
//! widens a tree's language to substring matches, subject to anchor
//! legality.
//!
//! ```
//! use antimirov::Pattern;
//!
//! let mut pattern = Pattern::parse("((h i) !*)").unwrap();
//! let nfa = pattern.to_automaton("pdo").unwrap();
//! assert!(nfa.evaluate("hi!!"));
//! assert!(!nfa.evaluate("oh hi"));
//!
//! pattern.partial_match(false).unwrap();
//! let nfa = pattern.to_automaton("pdo").unwrap();
//! assert!(nfa.evaluate("oh hi"));
//! ```

use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

mod charclass;
mod construct;
#[cfg(feature = "dot")]
mod dot;
mod enumerate;
mod nfa;
mod parse;
mod partial_match;
mod pddag;
mod regexp;

pub use charclass::{CharClass, Label, RangeError, RangeSet, SIGMA_MAX, SIGMA_MIN};
pub use construct::{to_automaton, Method, UnknownMethodError};
pub use enumerate::{Enumerator, Words};
pub use nfa::{Nfa, StateId};
pub use parse::{parse, ParseError};
pub use partial_match::{AnchorError, PartialMatchError};
pub use regexp::{Anchor, LinearForm, Regexp, SigTable};

/// Client handle for the external ambiguous-syntax normalizer: turns a
/// programmer-style pattern into grammar form. Constructed once by the
/// caller and passed by reference; failures are surfaced unchanged and
/// never retried here.
pub trait Normalize {
    fn normalize(&mut self, pattern: &str) -> Result<String, NormalizeError>;
}

/// A normalizer failure: the offending pattern plus the collaborator's
/// diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to normalize `{pattern}`:\n{log}")]
pub struct NormalizeError {
    pub pattern: String,
    pub log: String,
}

/// Any failure while producing a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Anchor(#[from] AnchorError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// A parsed expression and its working tree: the user-facing handle tying
/// together parsing, anchor validation, the one-shot boundary transform,
/// and automaton construction.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    /// As parsed, anchors intact; the boundary transform starts from here.
    raw: Rc<Regexp>,
    /// Anchors resolved or boundary-expanded; constructions read this.
    root: Rc<Regexp>,
    expanded: bool,
}

impl Pattern {
    /// Parse a grammar-form expression. Anchor legality is validated
    /// eagerly, so an illegal anchor fails here rather than at
    /// construction time.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let raw = parse::parse(text)?;
        let root = partial_match::replace_anchors(&raw, text)?;
        Ok(Pattern {
            text: text.to_owned(),
            raw,
            root,
            expanded: false,
        })
    }

    /// Parse a programmer-style pattern by way of the injected normalizer.
    pub fn from_programmers(
        normalizer: &mut impl Normalize,
        pattern: &str,
    ) -> Result<Self, PatternError> {
        let text = normalizer.normalize(pattern)?;
        Self::parse(&text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current working tree.
    pub fn root(&self) -> &Rc<Regexp> {
        &self.root
    }

    /// Rewrite the working tree so its language becomes "any text ·
    /// original language · any text". One-shot: a second invocation
    /// without `force` fails, catching accidental double application;
    /// `force` re-applies from the pristine parsed tree.
    pub fn partial_match(&mut self, force: bool) -> Result<&Rc<Regexp>, PartialMatchError> {
        if self.expanded && !force {
            return Err(PartialMatchError::AlreadyApplied);
        }
        self.root = partial_match::expand(&self.raw, &self.text)?;
        self.expanded = true;
        log::debug!("boundary transform: `{}` -> `{}`", self.text, self.root);
        Ok(&self.root)
    }

    /// Build the automaton for the working tree with the named
    /// construction method.
    pub fn to_automaton(&self, method: &str) -> Result<Nfa, UnknownMethodError> {
        let method = Method::from_str(method)?;
        Ok(construct::to_automaton(&self.root, method))
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_parses_and_builds() {
        let pattern = Pattern::parse("((0 + 1)*)").unwrap();
        let nfa = pattern.to_automaton("glushkov").unwrap();
        assert!(nfa.evaluate("0110"));
        assert!(!nfa.evaluate("012"));
    }

    #[test]
    fn unknown_method_is_rejected() {
        let pattern = Pattern::parse("a").unwrap();
        let err = pattern.to_automaton("brzozowski").unwrap_err();
        assert_eq!(err, UnknownMethodError("brzozowski".to_string()));
    }

    #[test]
    fn illegal_anchor_fails_at_parse() {
        let err = Pattern::parse("(a <ASTART>)").unwrap_err();
        assert!(matches!(err, PatternError::Anchor(_)));
    }

    #[test]
    fn legal_anchors_are_erased_for_exact_matching() {
        let pattern = Pattern::parse("(<ASTART> (a*) <AEND>)").unwrap();
        let nfa = pattern.to_automaton("pd").unwrap();
        assert!(nfa.evaluate(""));
        assert!(nfa.evaluate("aaa"));
        assert!(!nfa.evaluate("b"));
    }

    #[test]
    fn partial_match_is_one_shot() {
        let mut pattern = Pattern::parse("a").unwrap();
        pattern.partial_match(false).unwrap();
        assert_eq!(
            pattern.partial_match(false).unwrap_err(),
            PartialMatchError::AlreadyApplied
        );
        // forcing re-applies from the pristine tree instead of padding twice
        let forced = pattern.partial_match(true).unwrap().to_string();
        assert_eq!(forced, "((@any* a) @any*)");
    }

    #[test]
    fn normalizer_failures_surface_unchanged() {
        struct Failing;
        impl Normalize for Failing {
            fn normalize(&mut self, pattern: &str) -> Result<String, NormalizeError> {
                Err(NormalizeError {
                    pattern: pattern.to_owned(),
                    log: "unsupported lookbehind".to_owned(),
                })
            }
        }
        let err = Pattern::from_programmers(&mut Failing, "(?<=x)y").unwrap_err();
        assert!(matches!(err, PatternError::Normalize(_)));
    }

    #[test]
    fn normalizer_output_is_parsed() {
        struct Rewriter;
        impl Normalize for Rewriter {
            fn normalize(&mut self, _pattern: &str) -> Result<String, NormalizeError> {
                Ok("((a + b) c)".to_owned())
            }
        }
        let pattern = Pattern::from_programmers(&mut Rewriter, "[ab]c").unwrap();
        let nfa = pattern.to_automaton("follow").unwrap();
        assert!(nfa.evaluate("ac"));
        assert!(nfa.evaluate("bc"));
        assert!(!nfa.evaluate("c"));
    }
}
