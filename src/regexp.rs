//! The regular expression tree and its tree-local algebra: empty-word
//! property, Brzozowski derivatives, Antimirov partial derivatives, linear
//! forms, the exponential backtracking oracle, and structural compression.

use crate::charclass::{CharClass, Label};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// A boundary anchor: the match edge must coincide with the text edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Anchor {
    Start,
    End,
}

impl Display for Anchor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Start => write!(f, "<ASTART>"),
            Anchor::End => write!(f, "<AEND>"),
        }
    }
}

/// A regular expression tree. Children are shared behind [`Rc`] so
/// derivatives and the compression pass can reuse subtrees freely; the
/// variant set is closed and every operation matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Regexp {
    Epsilon,
    EmptySet,
    Symbol(char),
    Class(CharClass),
    Any,
    Concat(Rc<Regexp>, Rc<Regexp>),
    Disj(Rc<Regexp>, Rc<Regexp>),
    Star(Rc<Regexp>),
    Opt(Rc<Regexp>),
    Anchor(Anchor),
}

/// One-symbol continuations grouped by leaf transition rather than by
/// concrete symbol.
pub type LinearForm = IndexMap<Label, IndexSet<Rc<Regexp>>>;

/// Signature table for [`Regexp::compress`]: structurally equal subtrees
/// collapse to the representative stored here.
pub type SigTable = HashSet<Rc<Regexp>>;

impl Regexp {
    /// Concatenation with ∅ absorption and ε units.
    pub fn concat(l: Rc<Regexp>, r: Rc<Regexp>) -> Rc<Regexp> {
        match (&*l, &*r) {
            (Regexp::EmptySet, _) | (_, Regexp::EmptySet) => Rc::new(Regexp::EmptySet),
            (Regexp::Epsilon, _) => r,
            (_, Regexp::Epsilon) => l,
            _ => Rc::new(Regexp::Concat(l, r)),
        }
    }

    /// Disjunction with ∅ units and idempotence.
    pub fn disj(l: Rc<Regexp>, r: Rc<Regexp>) -> Rc<Regexp> {
        match (&*l, &*r) {
            (Regexp::EmptySet, _) => r,
            (_, Regexp::EmptySet) => l,
            _ if l == r => l,
            _ => Rc::new(Regexp::Disj(l, r)),
        }
    }

    /// Kleene star; `ε* = ∅* = ε` and `(r*)* = r*`.
    pub fn star(arg: Rc<Regexp>) -> Rc<Regexp> {
        match &*arg {
            Regexp::Epsilon | Regexp::EmptySet => Rc::new(Regexp::Epsilon),
            Regexp::Star(_) => arg,
            _ => Rc::new(Regexp::Star(arg)),
        }
    }

    /// Option; collapses when the argument already accepts ε.
    pub fn opt(arg: Rc<Regexp>) -> Rc<Regexp> {
        match &*arg {
            Regexp::EmptySet => Rc::new(Regexp::Epsilon),
            _ if arg.ewp() => arg,
            _ => Rc::new(Regexp::Opt(arg)),
        }
    }

    /// Empty-word property: does this tree accept the zero-length word?
    /// Anchors match the empty word at a legal boundary, so they count.
    pub fn ewp(&self) -> bool {
        match self {
            Regexp::Epsilon | Regexp::Anchor(_) => true,
            Regexp::EmptySet | Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => false,
            Regexp::Concat(l, r) => l.ewp() && r.ewp(),
            Regexp::Disj(l, r) => l.ewp() || r.ewp(),
            Regexp::Star(_) | Regexp::Opt(_) => true,
        }
    }

    /// Brzozowski derivative with respect to one symbol.
    pub fn derivative(self: &Rc<Self>, c: char) -> Rc<Regexp> {
        match &**self {
            Regexp::Epsilon | Regexp::EmptySet | Regexp::Anchor(_) => Rc::new(Regexp::EmptySet),
            Regexp::Symbol(s) => {
                if *s == c {
                    Rc::new(Regexp::Epsilon)
                } else {
                    Rc::new(Regexp::EmptySet)
                }
            }
            Regexp::Class(cc) => {
                if cc.contains(c) {
                    Rc::new(Regexp::Epsilon)
                } else {
                    Rc::new(Regexp::EmptySet)
                }
            }
            Regexp::Any => Rc::new(Regexp::Epsilon),
            Regexp::Concat(l, r) => {
                let through = Regexp::concat(l.derivative(c), r.clone());
                if l.ewp() {
                    Regexp::disj(through, r.derivative(c))
                } else {
                    through
                }
            }
            Regexp::Disj(l, r) => Regexp::disj(l.derivative(c), r.derivative(c)),
            Regexp::Star(a) => Regexp::concat(a.derivative(c), self.clone()),
            Regexp::Opt(a) => a.derivative(c),
        }
    }

    /// Membership by repeated derivation; the specification the automata
    /// are tested against.
    pub fn derivative_match(self: &Rc<Self>, word: &str) -> bool {
        let mut current = self.clone();
        for c in word.chars() {
            current = current.derivative(c);
            if matches!(&*current, Regexp::EmptySet) {
                return false;
            }
        }
        current.ewp()
    }

    /// Antimirov partial derivatives: the set of continuations after
    /// consuming `c`. Concatenation keeps non-vanishing continuations
    /// prefixed onto the right argument and adds the right argument's own
    /// derivatives when the left accepts ε.
    pub fn partial_derivatives(self: &Rc<Self>, c: char) -> IndexSet<Rc<Regexp>> {
        let mut out = IndexSet::new();
        match &**self {
            Regexp::Epsilon | Regexp::EmptySet | Regexp::Anchor(_) => {}
            Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => {
                if self.matches_symbol(c) {
                    out.insert(Rc::new(Regexp::Epsilon));
                }
            }
            Regexp::Concat(l, r) => {
                for pd in l.partial_derivatives(c) {
                    out.insert(Regexp::concat(pd, r.clone()));
                }
                if l.ewp() {
                    out.extend(r.partial_derivatives(c));
                }
            }
            Regexp::Disj(l, r) => {
                out.extend(l.partial_derivatives(c));
                out.extend(r.partial_derivatives(c));
            }
            Regexp::Star(a) => {
                for pd in a.partial_derivatives(c) {
                    out.insert(Regexp::concat(pd, self.clone()));
                }
            }
            Regexp::Opt(a) => {
                out.extend(a.partial_derivatives(c));
            }
        }
        out
    }

    /// Containment query on leaves: does this node, as a one-symbol
    /// matcher, accept `c`? Always false for composite nodes.
    pub fn matches_symbol(&self, c: char) -> bool {
        match self {
            Regexp::Symbol(s) => *s == c,
            Regexp::Class(cc) => cc.contains(c),
            Regexp::Any => true,
            _ => false,
        }
    }

    /// Linear form: partial derivatives grouped by the leaf transition that
    /// produces them.
    pub fn linear_form(self: &Rc<Self>) -> LinearForm {
        let mut lf = LinearForm::new();
        self.linear_form_into(&mut lf);
        lf
    }

    fn linear_form_into(self: &Rc<Self>, lf: &mut LinearForm) {
        match &**self {
            Regexp::Epsilon | Regexp::EmptySet | Regexp::Anchor(_) => {}
            Regexp::Symbol(c) => {
                lf.entry(Label::Symbol(*c))
                    .or_default()
                    .insert(Rc::new(Regexp::Epsilon));
            }
            Regexp::Class(cc) => {
                if let Some(label) = Label::class(cc.clone()) {
                    lf.entry(label).or_default().insert(Rc::new(Regexp::Epsilon));
                }
            }
            Regexp::Any => {
                lf.entry(Label::Any)
                    .or_default()
                    .insert(Rc::new(Regexp::Epsilon));
            }
            Regexp::Concat(l, r) => {
                for (label, pds) in l.linear_form() {
                    let entry = lf.entry(label).or_default();
                    for pd in pds {
                        entry.insert(Regexp::concat(pd, r.clone()));
                    }
                }
                if l.ewp() {
                    r.linear_form_into(lf);
                }
            }
            Regexp::Disj(l, r) => {
                l.linear_form_into(lf);
                r.linear_form_into(lf);
            }
            Regexp::Star(a) => {
                for (label, pds) in a.linear_form() {
                    let entry = lf.entry(label).or_default();
                    for pd in pds {
                        entry.insert(Regexp::concat(pd, self.clone()));
                    }
                }
            }
            Regexp::Opt(a) => {
                a.linear_form_into(lf);
            }
        }
    }

    /// Worst-case reference oracle: naive backtracking membership that
    /// tries every split point. Deliberately exponential; kept only so the
    /// automata have something slow to be compared against.
    pub fn matches_backtrack(&self, word: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        self.backtrack(&chars)
    }

    fn backtrack(&self, w: &[char]) -> bool {
        match self {
            Regexp::Epsilon | Regexp::Anchor(_) => w.is_empty(),
            Regexp::EmptySet => false,
            Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => {
                w.len() == 1 && self.matches_symbol(w[0])
            }
            Regexp::Concat(l, r) => {
                (0..=w.len()).any(|i| l.backtrack(&w[..i]) && r.backtrack(&w[i..]))
            }
            Regexp::Disj(l, r) => l.backtrack(w) || r.backtrack(w),
            Regexp::Star(a) => {
                w.is_empty()
                    || (1..=w.len()).any(|i| a.backtrack(&w[..i]) && self.backtrack(&w[i..]))
            }
            Regexp::Opt(a) => w.is_empty() || a.backtrack(w),
        }
    }

    /// Structural compression: rebuild the tree bottom-up, collapsing
    /// structurally identical subtrees onto the representative stored in
    /// the caller-supplied signature table. Idempotent; the resulting DAG
    /// shares nodes and must not be mutated (no API mutates trees).
    pub fn compress(self: &Rc<Self>, table: &mut SigTable) -> Rc<Regexp> {
        let rebuilt = match &**self {
            Regexp::Concat(l, r) => {
                Rc::new(Regexp::Concat(l.compress(table), r.compress(table)))
            }
            Regexp::Disj(l, r) => Rc::new(Regexp::Disj(l.compress(table), r.compress(table))),
            Regexp::Star(a) => Rc::new(Regexp::Star(a.compress(table))),
            Regexp::Opt(a) => Rc::new(Regexp::Opt(a.compress(table))),
            _ => self.clone(),
        };
        match table.get(&rebuilt) {
            Some(existing) => existing.clone(),
            None => {
                table.insert(rebuilt.clone());
                rebuilt
            }
        }
    }

    /// Does any anchor occur in this subtree?
    pub fn contains_anchor(&self) -> bool {
        match self {
            Regexp::Anchor(_) => true,
            Regexp::Concat(l, r) | Regexp::Disj(l, r) => {
                l.contains_anchor() || r.contains_anchor()
            }
            Regexp::Star(a) | Regexp::Opt(a) => a.contains_anchor(),
            _ => false,
        }
    }

    /// Number of nodes in the syntax tree.
    pub fn tree_length(&self) -> usize {
        match self {
            Regexp::Concat(l, r) | Regexp::Disj(l, r) => 1 + l.tree_length() + r.tree_length(),
            Regexp::Star(a) | Regexp::Opt(a) => 1 + a.tree_length(),
            _ => 1,
        }
    }
}

impl Display for Regexp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Regexp::Epsilon => write!(f, "@epsilon"),
            Regexp::EmptySet => write!(f, "@empty_set"),
            Regexp::Symbol(c) => write!(f, "{}", Label::Symbol(*c)),
            Regexp::Class(cc) => write!(f, "{cc}"),
            Regexp::Any => write!(f, "@any"),
            Regexp::Concat(l, r) => write!(f, "({l} {r})"),
            Regexp::Disj(l, r) => write!(f, "({l} + {r})"),
            Regexp::Star(a) => write!(f, "{a}*"),
            Regexp::Opt(a) => write!(f, "({a})?"),
            Regexp::Anchor(a) => write!(f, "{a}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn ewp() {
        assert!(parse("@epsilon").unwrap().ewp());
        assert!(!parse("a").unwrap().ewp());
        assert!(parse("a*").unwrap().ewp());
        assert!(parse("(a)?").unwrap().ewp());
        assert!(parse("(a* b*)").unwrap().ewp());
        assert!(!parse("(a b*)").unwrap().ewp());
        assert!(parse("(a + b*)").unwrap().ewp());
        assert!(!parse("(a + b)").unwrap().ewp());
    }

    #[test]
    fn derivative_membership() {
        let re = parse("((a b) c)").unwrap();
        assert!(re.derivative_match("abc"));
        assert!(!re.derivative_match("ab"));
        assert!(!re.derivative_match("abcd"));

        let re = parse("(0 + 1)*").unwrap();
        assert!(re.derivative_match(""));
        assert!(re.derivative_match("0110"));
        assert!(!re.derivative_match("012"));

        let re = parse("[0-9a-f]*").unwrap();
        assert!(re.derivative_match("deadbeef"));
        assert!(!re.derivative_match("DEADBEEF"));

        let re = parse("[^0-9]").unwrap();
        assert!(re.derivative_match("x"));
        assert!(!re.derivative_match("7"));
    }

    #[test]
    fn partial_derivatives_of_concat() {
        // pd_a((a + @epsilon) (a b)) = { (a b), b }
        let re = parse("((a + @epsilon) (a b))").unwrap();
        let pds = re.partial_derivatives('a');
        let printed: Vec<String> = pds.iter().map(|p| p.to_string()).collect();
        assert!(printed.contains(&"(a b)".to_string()));
        assert!(printed.contains(&"b".to_string()));
        assert_eq!(pds.len(), 2);
    }

    #[test]
    fn partial_derivatives_of_star() {
        let re = parse("(a b)*").unwrap();
        let pds = re.partial_derivatives('a');
        assert_eq!(pds.len(), 1);
        assert_eq!(pds[0].to_string(), "(b (a b)*)");
        assert!(re.partial_derivatives('b').is_empty());
    }

    #[test]
    fn linear_form_groups_by_leaf() {
        let re = parse("((a b) + (a c))").unwrap();
        let lf = re.linear_form();
        assert_eq!(lf.len(), 1);
        let (label, pds) = lf.first().unwrap();
        assert_eq!(*label, Label::Symbol('a'));
        assert_eq!(pds.len(), 2);

        let re = parse("([0-9] x)").unwrap();
        let lf = re.linear_form();
        assert_eq!(lf.len(), 1);
        assert!(matches!(lf.first().unwrap().0, Label::Class(_)));
    }

    #[test]
    fn backtrack_oracle_agrees_with_derivatives() {
        let samples = [
            ("((a b) c)", vec!["abc", "ab", "", "abcc"]),
            ("(a + b)*", vec!["", "a", "ba", "abab", "abc"]),
            ("((a)? (a b))", vec!["ab", "aab", "aab", "b"]),
            ("(@any (x)?)", vec!["q", "qx", "x", ""]),
        ];
        for (expr, words) in samples {
            let re = parse(expr).unwrap();
            for w in words {
                assert_eq!(
                    re.matches_backtrack(w),
                    re.derivative_match(w),
                    "{expr} on {w:?}"
                );
            }
        }
    }

    #[test]
    fn compress_shares_identical_subtrees() {
        let re = parse("((a b) + (a b))").unwrap();
        let mut table = SigTable::new();
        let compressed = re.compress(&mut table);
        if let Regexp::Disj(l, r) = &*compressed {
            assert!(Rc::ptr_eq(l, r));
        } else {
            panic!("expected disjunction, got {compressed}");
        }

        // idempotent: a second pass through the same table is the identity
        let again = compressed.compress(&mut table);
        assert!(Rc::ptr_eq(&again, &compressed));
    }

    #[test]
    fn smart_constructors_normalize() {
        let a = Rc::new(Regexp::Symbol('a'));
        let eps = Rc::new(Regexp::Epsilon);
        let empty = Rc::new(Regexp::EmptySet);
        assert_eq!(*Regexp::concat(eps.clone(), a.clone()), *a);
        assert_eq!(*Regexp::concat(a.clone(), empty.clone()), Regexp::EmptySet);
        assert_eq!(*Regexp::disj(empty.clone(), a.clone()), *a);
        assert_eq!(*Regexp::star(eps.clone()), Regexp::Epsilon);
        assert_eq!(
            Regexp::star(Regexp::star(a.clone())),
            Regexp::star(a.clone())
        );
        assert_eq!(*Regexp::opt(Regexp::star(a.clone())), Regexp::Star(a));
    }

    #[test]
    fn display_round_trips_through_parser() {
        for expr in ["((a b) c)", "(a + b)*", "([0-9a-f])?", "(@any + @epsilon)"] {
            let re = parse(expr).unwrap();
            let reparsed = parse(&re.to_string()).unwrap();
            assert_eq!(re, reparsed);
        }
    }
}
