//! The construction strategies turning a tree into an automaton:
//! structural (thompson), marked-position (glushkov, position),
//! linear-form sets (follow), and partial-derivative worklists (pd, pdo).
//! The hash-consed DAG variant (pddag) lives in [`crate::pddag`].

use crate::charclass::Label;
use crate::nfa::{Nfa, StateId};
use crate::pddag::Dag;
use crate::regexp::{LinearForm, Regexp};
use indexmap::{IndexMap, IndexSet};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

/// A construction method name that names no construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown construction method `{0}`; expected one of thompson, glushkov, position, follow, pd, pdo, pddag")]
pub struct UnknownMethodError(pub String);

/// The available tree→automaton constructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Thompson,
    Glushkov,
    Position,
    Follow,
    PartialDerivative,
    PartialDerivativeMemo,
    PartialDerivativeDag,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Thompson,
        Method::Glushkov,
        Method::Position,
        Method::Follow,
        Method::PartialDerivative,
        Method::PartialDerivativeMemo,
        Method::PartialDerivativeDag,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Thompson => "thompson",
            Method::Glushkov => "glushkov",
            Method::Position => "position",
            Method::Follow => "follow",
            Method::PartialDerivative => "pd",
            Method::PartialDerivativeMemo => "pdo",
            Method::PartialDerivativeDag => "pddag",
        }
    }
}

impl FromStr for Method {
    type Err = UnknownMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thompson" => Ok(Method::Thompson),
            "glushkov" => Ok(Method::Glushkov),
            "position" => Ok(Method::Position),
            "follow" => Ok(Method::Follow),
            "pd" => Ok(Method::PartialDerivative),
            "pdo" => Ok(Method::PartialDerivativeMemo),
            "pddag" => Ok(Method::PartialDerivativeDag),
            other => Err(UnknownMethodError(other.to_owned())),
        }
    }
}

/// Build the automaton for `re` with the chosen construction. Anchors, if
/// still present, construct as ε; their legality is the boundary
/// transform's concern.
pub fn to_automaton(re: &Rc<Regexp>, method: Method) -> Nfa {
    let nfa = match method {
        Method::Thompson => thompson(re),
        Method::Glushkov => glushkov(re),
        Method::Position => position(re),
        Method::Follow => follow(re),
        Method::PartialDerivative => partial_derivative(re, false),
        Method::PartialDerivativeMemo => partial_derivative(re, true),
        Method::PartialDerivativeDag => Dag::new(re).into_nfa(),
    };
    log::debug!("{}: {} states", method.name(), nfa.state_count());
    nfa
}

pub(crate) fn leaf_label(re: &Regexp) -> Option<Label> {
    match re {
        Regexp::Symbol(c) => Some(Label::Symbol(*c)),
        Regexp::Class(cc) => Label::class(cc.clone()),
        Regexp::Any => Some(Label::Any),
        _ => None,
    }
}

// ---------------------------------------------------------------- thompson

/// One fragment per subtree, glued with ε-transitions.
fn thompson(re: &Rc<Regexp>) -> Nfa {
    let mut nfa = Nfa::new();
    let (start, end) = thompson_fragment(re, &mut nfa);
    nfa.add_initial(start);
    nfa.add_final(end);
    nfa
}

fn thompson_fragment(re: &Rc<Regexp>, nfa: &mut Nfa) -> (StateId, StateId) {
    let start = nfa.add_state();
    let end = nfa.add_state();
    match &**re {
        Regexp::Epsilon | Regexp::Anchor(_) => nfa.add_epsilon(start, end),
        Regexp::EmptySet => {}
        Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => {
            if let Some(label) = leaf_label(re) {
                nfa.add_transition(start, label, end);
            }
        }
        Regexp::Concat(l, r) => {
            let (ls, le) = thompson_fragment(l, nfa);
            let (rs, re_) = thompson_fragment(r, nfa);
            nfa.add_epsilon(start, ls);
            nfa.add_epsilon(le, rs);
            nfa.add_epsilon(re_, end);
        }
        Regexp::Disj(l, r) => {
            let (ls, le) = thompson_fragment(l, nfa);
            let (rs, re_) = thompson_fragment(r, nfa);
            nfa.add_epsilon(start, ls);
            nfa.add_epsilon(start, rs);
            nfa.add_epsilon(le, end);
            nfa.add_epsilon(re_, end);
        }
        Regexp::Star(a) => {
            let (as_, ae) = thompson_fragment(a, nfa);
            nfa.add_epsilon(start, end);
            nfa.add_epsilon(start, as_);
            nfa.add_epsilon(ae, end);
            nfa.add_epsilon(ae, as_);
        }
        Regexp::Opt(a) => {
            let (as_, ae) = thompson_fragment(a, nfa);
            nfa.add_epsilon(start, end);
            nfa.add_epsilon(start, as_);
            nfa.add_epsilon(ae, end);
        }
    }
    (start, end)
}

// ---------------------------------------------------------------- glushkov

/// A built fragment: where it can stop, the transitions entering it, and
/// whether it accepts ε.
struct Fragment {
    exits: IndexSet<StateId>,
    firsts: Vec<(Label, StateId)>,
    ewp: bool,
}

/// Marked-position construction threading entry state sets: every leaf
/// becomes one state, transitions are added as the traversal discovers
/// which states can precede each leaf. ε-free.
fn glushkov(re: &Rc<Regexp>) -> Nfa {
    let mut nfa = Nfa::new();
    let start = nfa.add_state();
    nfa.add_initial(start);
    let entry = IndexSet::from([start]);
    let fragment = glushkov_step(re, &mut nfa, &entry);
    for s in fragment.exits {
        nfa.add_final(s);
    }
    if fragment.ewp {
        nfa.add_final(start);
    }
    nfa
}

fn glushkov_step(re: &Rc<Regexp>, nfa: &mut Nfa, entry: &IndexSet<StateId>) -> Fragment {
    match &**re {
        Regexp::Epsilon | Regexp::Anchor(_) => Fragment {
            exits: IndexSet::new(),
            firsts: Vec::new(),
            ewp: true,
        },
        Regexp::EmptySet => Fragment {
            exits: IndexSet::new(),
            firsts: Vec::new(),
            ewp: false,
        },
        Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => {
            let target = nfa.add_state();
            let mut firsts = Vec::new();
            if let Some(label) = leaf_label(re) {
                for &source in entry {
                    nfa.add_transition(source, label.clone(), target);
                }
                firsts.push((label, target));
            }
            Fragment {
                exits: IndexSet::from([target]),
                firsts,
                ewp: false,
            }
        }
        Regexp::Concat(l, r) => {
            let left = glushkov_step(l, nfa, entry);
            let mut right_entry = left.exits.clone();
            if left.ewp {
                right_entry.extend(entry.iter().copied());
            }
            let right = glushkov_step(r, nfa, &right_entry);

            let mut exits = right.exits;
            if right.ewp {
                exits.extend(left.exits.iter().copied());
            }
            let mut firsts = left.firsts;
            if left.ewp {
                firsts.extend(right.firsts.iter().cloned());
            }
            Fragment {
                exits,
                firsts,
                ewp: left.ewp && right.ewp,
            }
        }
        Regexp::Disj(l, r) => {
            let left = glushkov_step(l, nfa, entry);
            let right = glushkov_step(r, nfa, entry);
            let mut exits = left.exits;
            exits.extend(right.exits.iter().copied());
            let mut firsts = left.firsts;
            firsts.extend(right.firsts.iter().cloned());
            Fragment {
                exits,
                firsts,
                ewp: left.ewp || right.ewp,
            }
        }
        Regexp::Star(a) => {
            let inner = glushkov_step(a, nfa, entry);
            for &exit in &inner.exits {
                for (label, target) in &inner.firsts {
                    nfa.add_transition(exit, label.clone(), *target);
                }
            }
            Fragment {
                exits: inner.exits,
                firsts: inner.firsts,
                ewp: true,
            }
        }
        Regexp::Opt(a) => {
            let inner = glushkov_step(a, nfa, entry);
            Fragment {
                exits: inner.exits,
                firsts: inner.firsts,
                ewp: true,
            }
        }
    }
}

// ---------------------------------------------------------------- position

#[derive(Default)]
struct PositionSets {
    labels: Vec<Label>,
    follow: Vec<IndexSet<usize>>,
}

struct PositionNode {
    nullable: bool,
    first: IndexSet<usize>,
    last: IndexSet<usize>,
}

/// Classic marked-position construction: number the leaves, compute
/// first/last/follow sets, then emit one state per position plus the
/// start state. Same language as glushkov, derived through the sets.
fn position(re: &Rc<Regexp>) -> Nfa {
    let mut sets = PositionSets::default();
    let root = position_walk(re, &mut sets);

    let mut nfa = Nfa::new();
    let start = nfa.add_state();
    nfa.add_initial(start);
    let states: Vec<StateId> = sets.labels.iter().map(|_| nfa.add_state()).collect();

    for &p in &root.first {
        nfa.add_transition(start, sets.labels[p].clone(), states[p]);
    }
    for (p, follow) in sets.follow.iter().enumerate() {
        for &q in follow {
            nfa.add_transition(states[p], sets.labels[q].clone(), states[q]);
        }
    }
    for &p in &root.last {
        nfa.add_final(states[p]);
    }
    if root.nullable {
        nfa.add_final(start);
    }
    nfa
}

fn position_walk(re: &Rc<Regexp>, sets: &mut PositionSets) -> PositionNode {
    match &**re {
        Regexp::Epsilon | Regexp::Anchor(_) => PositionNode {
            nullable: true,
            first: IndexSet::new(),
            last: IndexSet::new(),
        },
        Regexp::EmptySet => PositionNode {
            nullable: false,
            first: IndexSet::new(),
            last: IndexSet::new(),
        },
        Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => match leaf_label(re) {
            Some(label) => {
                let p = sets.labels.len();
                sets.labels.push(label);
                sets.follow.push(IndexSet::new());
                PositionNode {
                    nullable: false,
                    first: IndexSet::from([p]),
                    last: IndexSet::from([p]),
                }
            }
            // a void class marks a position no symbol reaches
            None => PositionNode {
                nullable: false,
                first: IndexSet::new(),
                last: IndexSet::new(),
            },
        },
        Regexp::Concat(l, r) => {
            let left = position_walk(l, sets);
            let right = position_walk(r, sets);
            for &p in &left.last {
                sets.follow[p].extend(right.first.iter().copied());
            }
            let mut first = left.first;
            if left.nullable {
                first.extend(right.first.iter().copied());
            }
            let mut last = right.last;
            if right.nullable {
                last.extend(left.last.iter().copied());
            }
            PositionNode {
                nullable: left.nullable && right.nullable,
                first,
                last,
            }
        }
        Regexp::Disj(l, r) => {
            let left = position_walk(l, sets);
            let right = position_walk(r, sets);
            let mut first = left.first;
            first.extend(right.first.iter().copied());
            let mut last = left.last;
            last.extend(right.last.iter().copied());
            PositionNode {
                nullable: left.nullable || right.nullable,
                first,
                last,
            }
        }
        Regexp::Star(a) => {
            let inner = position_walk(a, sets);
            for &p in &inner.last {
                sets.follow[p].extend(inner.first.iter().copied());
            }
            PositionNode {
                nullable: true,
                first: inner.first,
                last: inner.last,
            }
        }
        Regexp::Opt(a) => {
            let inner = position_walk(a, sets);
            PositionNode {
                nullable: true,
                first: inner.first,
                last: inner.last,
            }
        }
    }
}

// ------------------------------------------------------------------ follow

/// States are partial-derivative sets: the merged linear form of a set
/// defines one transition per head, leading to the state holding that
/// head's full derivative set.
fn follow(re: &Rc<Regexp>) -> Nfa {
    type SetState = BTreeSet<Rc<Regexp>>;

    let mut nfa = Nfa::new();
    let mut states: IndexMap<SetState, StateId> = IndexMap::new();
    let mut worklist: VecDeque<SetState> = VecDeque::new();

    let start: SetState = BTreeSet::from([re.clone()]);
    let id = nfa.add_state();
    nfa.add_initial(id);
    if start.iter().any(|m| m.ewp()) {
        nfa.add_final(id);
    }
    states.insert(start.clone(), id);
    worklist.push_back(start);

    while let Some(current) = worklist.pop_front() {
        let from = states[&current];
        let mut merged = LinearForm::new();
        for member in &current {
            for (label, pds) in member.linear_form() {
                merged.entry(label).or_default().extend(pds);
            }
        }
        for (label, pds) in merged {
            let target: SetState = pds.into_iter().collect();
            let to = match states.get(&target) {
                Some(&id) => id,
                None => {
                    let id = nfa.add_state();
                    if target.iter().any(|m| m.ewp()) {
                        nfa.add_final(id);
                    }
                    states.insert(target.clone(), id);
                    worklist.push_back(target);
                    id
                }
            };
            nfa.add_transition(from, label, to);
        }
    }
    nfa
}

// ----------------------------------------------------------------- pd, pdo

/// Partial-derivative construction: states are discovered derivative
/// trees. With `memo` set, linear forms are cached by structural identity
/// for the duration of the construction; the accepted language and shape
/// are unchanged.
fn partial_derivative(re: &Rc<Regexp>, memo: bool) -> Nfa {
    let mut nfa = Nfa::new();
    let mut states: IndexMap<Rc<Regexp>, StateId> = IndexMap::new();
    let mut worklist: VecDeque<Rc<Regexp>> = VecDeque::new();
    let mut cache: HashMap<Rc<Regexp>, LinearForm> = HashMap::new();

    let id = nfa.add_state();
    nfa.add_initial(id);
    if re.ewp() {
        nfa.add_final(id);
    }
    states.insert(re.clone(), id);
    worklist.push_back(re.clone());

    while let Some(current) = worklist.pop_front() {
        let from = states[&current];
        let lf = if memo {
            cache
                .entry(current.clone())
                .or_insert_with(|| current.linear_form())
                .clone()
        } else {
            current.linear_form()
        };
        for (label, pds) in lf {
            for pd in pds {
                let to = match states.get(&pd) {
                    Some(&id) => id,
                    None => {
                        let id = nfa.add_state();
                        if pd.ewp() {
                            nfa.add_final(id);
                        }
                        states.insert(pd.clone(), id);
                        worklist.push_back(pd.clone());
                        id
                    }
                };
                nfa.add_transition(from, label.clone(), to);
            }
        }
    }
    nfa
}
