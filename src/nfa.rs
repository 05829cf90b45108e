//! The generalized NFA: states are small integers, edges carry literal
//! symbols, symbol sets, or ε. Provides membership evaluation, the lazy
//! product construction, dead-state trimming, ε-elimination, and the
//! shortest-word witness search.

use crate::charclass::Label;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, VecDeque};

pub type StateId = usize;

/// Outgoing edges of one state. Literal and symbol-set transitions are
/// stored in separate maps but exposed through the unified label view.
#[derive(Debug, Clone, Default)]
struct Transitions {
    epsilon: IndexSet<StateId>,
    symbols: IndexMap<char, IndexSet<StateId>>,
    classes: IndexMap<Label, IndexSet<StateId>>,
}

#[derive(Debug, Clone, Default)]
pub struct Nfa {
    states: Vec<Transitions>,
    initial: IndexSet<StateId>,
    finals: IndexSet<StateId>,
}

impl Nfa {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain automaton accepting every word of length `n..=m`.
    pub fn length(n: usize, m: usize) -> Nfa {
        let mut nfa = Nfa::new();
        let mut prev = nfa.add_state();
        nfa.add_initial(prev);
        if n == 0 {
            nfa.add_final(prev);
        }
        for i in 1..=m {
            let s = nfa.add_state();
            nfa.add_transition(prev, Label::Any, s);
            if i >= n {
                nfa.add_final(s);
            }
            prev = s;
        }
        nfa
    }

    pub fn add_state(&mut self) -> StateId {
        self.states.push(Transitions::default());
        self.states.len() - 1
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn add_initial(&mut self, s: StateId) {
        debug_assert!(s < self.states.len());
        self.initial.insert(s);
    }

    pub fn add_final(&mut self, s: StateId) {
        debug_assert!(s < self.states.len());
        self.finals.insert(s);
    }

    pub fn initial(&self) -> &IndexSet<StateId> {
        &self.initial
    }

    pub fn finals(&self) -> &IndexSet<StateId> {
        &self.finals
    }

    pub fn is_final(&self, s: StateId) -> bool {
        self.finals.contains(&s)
    }

    pub fn add_transition(&mut self, from: StateId, label: Label, to: StateId) {
        debug_assert!(from < self.states.len() && to < self.states.len());
        match label {
            Label::Symbol(c) => {
                self.states[from].symbols.entry(c).or_default().insert(to);
            }
            other => {
                self.states[from].classes.entry(other).or_default().insert(to);
            }
        }
    }

    pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
        debug_assert!(from < self.states.len() && to < self.states.len());
        self.states[from].epsilon.insert(to);
    }

    /// Unified view over literal and symbol-set transitions of one state.
    pub fn labels(&self, s: StateId) -> impl Iterator<Item = (Label, &IndexSet<StateId>)> + '_ {
        let t = &self.states[s];
        t.symbols
            .iter()
            .map(|(c, set)| (Label::Symbol(*c), set))
            .chain(t.classes.iter().map(|(l, set)| (l.clone(), set)))
    }

    pub fn epsilon_targets(&self, s: StateId) -> &IndexSet<StateId> {
        &self.states[s].epsilon
    }

    pub fn epsilon_closure(&self, states: impl IntoIterator<Item = StateId>) -> IndexSet<StateId> {
        let mut closure: IndexSet<StateId> = states.into_iter().collect();
        let mut i = 0;
        while let Some(&s) = closure.get_index(i) {
            for &t in &self.states[s].epsilon {
                closure.insert(t);
            }
            i += 1;
        }
        closure
    }

    /// One symbol step from a state set, ε-closed.
    pub fn eval_symbol(&self, states: &IndexSet<StateId>, c: char) -> IndexSet<StateId> {
        let mut next = IndexSet::new();
        for &s in states {
            let t = &self.states[s];
            if let Some(set) = t.symbols.get(&c) {
                next.extend(set.iter().copied());
            }
            for (label, set) in &t.classes {
                if label.matches(c) {
                    next.extend(set.iter().copied());
                }
            }
        }
        self.epsilon_closure(next)
    }

    /// Word membership.
    pub fn evaluate(&self, word: &str) -> bool {
        let mut current = self.epsilon_closure(self.initial.iter().copied());
        for c in word.chars() {
            if current.is_empty() {
                return false;
            }
            current = self.eval_symbol(&current, c);
        }
        current.iter().any(|&s| self.is_final(s))
    }

    /// Does the automaton accept the empty word?
    pub fn ewp(&self) -> bool {
        self.epsilon_closure(self.initial.iter().copied())
            .iter()
            .any(|&s| self.is_final(s))
    }

    /// Lazy synchronized product: states are discovered `(state, state)`
    /// pairs; a transition pair survives only if its labels intersect, and
    /// ε pairs only with ε. A pair is final iff both components are.
    pub fn product(&self, other: &Nfa) -> Nfa {
        let mut out = Nfa::new();
        let mut index: IndexMap<(StateId, StateId), StateId> = IndexMap::new();
        let mut worklist: Vec<(StateId, StateId)> = Vec::new();

        for &si in &self.initial {
            for &oi in &other.initial {
                let id = out.add_state();
                index.insert((si, oi), id);
                out.add_initial(id);
                if self.is_final(si) && other.is_final(oi) {
                    out.add_final(id);
                }
                worklist.push((si, oi));
            }
        }

        while let Some((s, o)) = worklist.pop() {
            let from = index[&(s, o)];
            let mut reach = |pair: (StateId, StateId),
                             out: &mut Nfa,
                             index: &mut IndexMap<(StateId, StateId), StateId>,
                             worklist: &mut Vec<(StateId, StateId)>|
             -> StateId {
                if let Some(&id) = index.get(&pair) {
                    return id;
                }
                let id = out.add_state();
                index.insert(pair, id);
                if self.is_final(pair.0) && other.is_final(pair.1) {
                    out.add_final(id);
                }
                worklist.push(pair);
                id
            };

            for &sn in &self.states[s].epsilon {
                for &on in &other.states[o].epsilon {
                    let to = reach((sn, on), &mut out, &mut index, &mut worklist);
                    out.add_epsilon(from, to);
                }
            }
            for (sl, stargets) in self.labels(s) {
                for (ol, otargets) in other.labels(o) {
                    let Some(label) = sl.intersect(&ol) else {
                        continue;
                    };
                    for &sn in stargets {
                        for &on in otargets {
                            let to = reach((sn, on), &mut out, &mut index, &mut worklist);
                            out.add_transition(from, label.clone(), to);
                        }
                    }
                }
            }
        }

        log::trace!(
            "product: {} x {} -> {} states",
            self.state_count(),
            other.state_count(),
            out.state_count()
        );
        out
    }

    /// The states lying on some initial→final path: forward reachability
    /// recording predecessors, then backward propagation from the
    /// reachable finals.
    pub fn useful_states(&self) -> IndexSet<StateId> {
        let mut reachable: IndexSet<StateId> = self.initial.iter().copied().collect();
        let mut preds: HashMap<StateId, IndexSet<StateId>> = HashMap::new();
        let mut worklist: Vec<StateId> = reachable.iter().copied().collect();
        while let Some(s) = worklist.pop() {
            let targets: Vec<StateId> = self.states[s]
                .epsilon
                .iter()
                .copied()
                .chain(self.labels(s).flat_map(|(_, set)| set.iter().copied()))
                .collect();
            for t in targets {
                preds.entry(t).or_default().insert(s);
                if reachable.insert(t) {
                    worklist.push(t);
                }
            }
        }

        let mut useful: IndexSet<StateId> = reachable
            .iter()
            .copied()
            .filter(|s| self.finals.contains(s))
            .collect();
        let mut worklist: Vec<StateId> = useful.iter().copied().collect();
        while let Some(s) = worklist.pop() {
            for &p in preds.get(&s).into_iter().flatten() {
                if useful.insert(p) {
                    worklist.push(p);
                }
            }
        }
        useful
    }

    /// Rebuild the automaton on exactly the useful states.
    pub fn trim(&self) -> Nfa {
        let useful = self.useful_states();
        let mut out = Nfa::new();
        let mut map: HashMap<StateId, StateId> = HashMap::new();
        for &s in &useful {
            map.insert(s, out.add_state());
        }
        for &s in &useful {
            let from = map[&s];
            if self.initial.contains(&s) {
                out.add_initial(from);
            }
            if self.finals.contains(&s) {
                out.add_final(from);
            }
            for &t in &self.states[s].epsilon {
                if let Some(&to) = map.get(&t) {
                    out.add_epsilon(from, to);
                }
            }
            for (label, targets) in self.labels(s) {
                for &t in targets {
                    if let Some(&to) = map.get(&t) {
                        out.add_transition(from, label.clone(), to);
                    }
                }
            }
        }
        log::trace!("trim: {} -> {} states", self.state_count(), out.state_count());
        out
    }

    /// Eliminate ε-transitions in place: every state absorbs the labeled
    /// transitions and finality of its ε-closure, then the ε-edges are
    /// dropped. Required before enumeration.
    pub fn eliminate_epsilon(&mut self) {
        for s in 0..self.states.len() {
            let closure = self.epsilon_closure([s]);
            let mut absorbed: Vec<(Label, StateId)> = Vec::new();
            let mut make_final = false;
            for &t in &closure {
                if t == s {
                    continue;
                }
                if self.is_final(t) {
                    make_final = true;
                }
                for (label, targets) in self.labels(t) {
                    for &to in targets {
                        absorbed.push((label.clone(), to));
                    }
                }
            }
            if make_final {
                self.add_final(s);
            }
            for (label, to) in absorbed {
                self.add_transition(s, label, to);
            }
        }
        for t in &mut self.states {
            t.epsilon.clear();
        }
    }

    /// The shortlex-least nonempty accepted word, or `None` when the
    /// nonempty language is empty. Ties break toward the smallest symbol
    /// of each label; ε-edges extend a prefix by nothing, and a state
    /// known only through an empty prefix stays improvable so ε-cycles
    /// can still produce a word.
    pub fn witness(&self) -> Option<String> {
        let mut best: HashMap<StateId, Vec<char>> = HashMap::new();
        let mut worklist: VecDeque<StateId> = VecDeque::new();
        for s in self.epsilon_closure(self.initial.iter().copied()) {
            best.insert(s, Vec::new());
            worklist.push_back(s);
        }

        let mut min_word: Option<Vec<char>> = None;
        while let Some(s) = worklist.pop_front() {
            let prefix = best.get(&s).cloned().unwrap_or_default();
            if self.is_final(s) && !prefix.is_empty() {
                let better = match &min_word {
                    Some(w) => shortlex_less(&prefix, w),
                    None => true,
                };
                if better {
                    min_word = Some(prefix.clone());
                }
            }

            let mut relax = |to: StateId, candidate: Vec<char>| {
                let improved = match best.get(&to) {
                    None => true,
                    Some(old) => {
                        (old.is_empty() && !candidate.is_empty())
                            || (!old.is_empty() && shortlex_less(&candidate, old))
                    }
                };
                if improved {
                    best.insert(to, candidate);
                    worklist.push_back(to);
                }
            };

            for &t in &self.states[s].epsilon {
                relax(t, prefix.clone());
            }
            for (label, targets) in self.labels(s) {
                let Some(c) = label.min_symbol() else {
                    continue;
                };
                let mut candidate = prefix.clone();
                candidate.push(c);
                for &t in targets {
                    relax(t, candidate.clone());
                }
            }
        }
        min_word.map(|w| w.into_iter().collect())
    }
}

/// Length-major, then lexicographic.
pub(crate) fn shortlex_less(a: &[char], b: &[char]) -> bool {
    match a.len().cmp(&b.len()) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => a < b,
    }
}
