//! Order-preserving enumeration of an automaton's language: length-major,
//! then lexicographic. Each length is served by the memoized trimmed
//! product of the automaton with the exact-length chain automaton, in
//! which every state sits at a fixed depth, so greedy minimal steps yield
//! the cross-section minimum and backtracking yields successors.

use crate::nfa::{Nfa, StateId};
use indexmap::IndexSet;
use std::collections::HashMap;

/// Enumerates an automaton's language in shortlex order. Owns an ε-free,
/// trimmed copy and the per-length product memo; the memo lives as long
/// as the enumerator.
#[derive(Debug, Clone)]
pub struct Enumerator {
    aut: Nfa,
    sized: HashMap<usize, Nfa>,
}

impl Nfa {
    /// Set up enumeration: ε-transitions are eliminated and dead states
    /// trimmed on a copy; the automaton itself is left untouched.
    pub fn enumerator(&self) -> Enumerator {
        let mut aut = self.clone();
        aut.eliminate_epsilon();
        Enumerator {
            aut: aut.trim(),
            sized: HashMap::new(),
        }
    }
}

impl Enumerator {
    /// Does the enumerated language contain the empty word?
    pub fn ewp(&self) -> bool {
        self.aut.ewp()
    }

    /// The trimmed product with the exact-length automaton, memoized per
    /// length. Every surviving state lies at one fixed depth and on a
    /// path to a depth-`n` final state.
    fn sized(&mut self, n: usize) -> &Nfa {
        if !self.sized.contains_key(&n) {
            let product = self.aut.product(&Nfa::length(n, n)).trim();
            log::trace!("sized({n}): {} states", product.state_count());
            self.sized.insert(n, product);
        }
        &self.sized[&n]
    }

    /// The minimal word of length `len`, or `None` when the cross-section
    /// is empty.
    pub fn min_word(&mut self, len: usize) -> Option<String> {
        if len == 0 {
            return self.aut.ewp().then(String::new);
        }
        let sized = self.sized(len);
        let mut states = sized.initial().clone();
        if states.is_empty() {
            return None;
        }
        let mut word = String::with_capacity(len);
        for _ in 0..len {
            let c = min_symbol(sized, &states)?;
            word.push(c);
            states = sized.eval_symbol(&states, c);
        }
        debug_assert!(states.iter().any(|&s| sized.is_final(s)));
        Some(word)
    }

    /// The next word of the same length after `current` in lexicographic
    /// order, or `None` when `current` closes its cross-section. Re-walks
    /// the current word recording the state set at every prefix depth,
    /// backtracks to the deepest position that admits a strictly larger
    /// symbol, then forward-fills minimally.
    pub fn next_word(&mut self, current: &str) -> Option<String> {
        let chars: Vec<char> = current.chars().collect();
        let n = chars.len();
        if n == 0 {
            return None;
        }
        let sized = self.sized(n);

        let mut stack: Vec<IndexSet<StateId>> = Vec::with_capacity(n);
        stack.push(sized.initial().clone());
        for &c in &chars[..n - 1] {
            let next = sized.eval_symbol(&stack[stack.len() - 1], c);
            stack.push(next);
        }

        for depth in (0..n).rev() {
            let states = &stack[depth];
            let bound = chars[depth];
            let candidate = states
                .iter()
                .flat_map(|&s| sized.labels(s))
                .filter_map(|(label, _)| label.next_above(Some(bound)))
                .min();
            let Some(c) = candidate else {
                continue;
            };
            let mut word: Vec<char> = chars[..depth].to_vec();
            word.push(c);
            let mut states = sized.eval_symbol(&stack[depth], c);
            for _ in depth + 1..n {
                let c = min_symbol(sized, &states)?;
                word.push(c);
                states = sized.eval_symbol(&states, c);
            }
            return Some(word.into_iter().collect());
        }
        None
    }

    /// All words of length `n`, in order.
    pub fn cross_section(&mut self, n: usize) -> Vec<String> {
        let mut words = Vec::new();
        let mut current = self.min_word(n);
        while let Some(word) = current {
            current = if word.is_empty() {
                None
            } else {
                self.next_word(&word)
            };
            words.push(word);
        }
        words
    }

    /// Lazy shortlex enumeration of every word with length in
    /// `lo ..= hi` (unbounded above when `hi` is `None`). The empty word
    /// comes first when it is in range and accepted. Restart by calling
    /// again.
    pub fn words(&mut self, lo: usize, hi: Option<usize>) -> Words<'_> {
        Words {
            empty_pending: lo == 0,
            length: lo.max(1),
            hi,
            current: None,
            enumerator: self,
        }
    }
}

/// The smallest symbol leaving any state of the set.
fn min_symbol(nfa: &Nfa, states: &IndexSet<StateId>) -> Option<char> {
    states
        .iter()
        .flat_map(|&s| nfa.labels(s))
        .filter_map(|(label, _)| label.min_symbol())
        .min()
}

/// Iterator over an enumerated language; see [`Enumerator::words`].
pub struct Words<'a> {
    enumerator: &'a mut Enumerator,
    empty_pending: bool,
    length: usize,
    hi: Option<usize>,
    current: Option<String>,
}

impl Iterator for Words<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.empty_pending {
            self.empty_pending = false;
            if self.enumerator.ewp() {
                return Some(String::new());
            }
        }
        loop {
            if matches!(self.hi, Some(hi) if self.length > hi) {
                return None;
            }
            let word = match self.current.take() {
                None => self.enumerator.min_word(self.length),
                Some(prev) => self.enumerator.next_word(&prev),
            };
            match word {
                Some(w) => {
                    self.current = Some(w.clone());
                    return Some(w);
                }
                None => {
                    self.length += 1;
                    self.current = None;
                }
            }
        }
    }
}
