//! Hash-consed partial-derivative DAG: a construction-scoped arena in
//! which structurally identical sub-results collapse to one node. Linear
//! forms are composed over node ids (`cat_lf`, `plus_lf`) with reuse
//! detection through reverse-edge tables, so expressions with shared
//! substructure flatten into the minimal distinct-state automaton.

use crate::charclass::Label;
use crate::nfa::Nfa;
use crate::regexp::Regexp;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

type NodeId = usize;

/// The ε node: id 0 in every arena.
const EPS: NodeId = 0;

type Diff = IndexMap<Label, IndexSet<NodeId>>;

#[derive(Debug, Default)]
struct Node {
    ewp: bool,
    /// Concat argument pair, kept for delayed diff computation.
    concat_args: Option<(NodeId, NodeId)>,
    /// The star/option node built over this node, if any.
    star: Option<NodeId>,
    option: Option<NodeId>,
    /// Reverse edges: concat nodes with this node as left/right argument,
    /// and disjunction nodes containing it.
    dotl: HashSet<NodeId>,
    dotr: HashSet<NodeId>,
    plus: HashSet<NodeId>,
    /// Linear form over node ids.
    diff: Diff,
}

/// The arena. Lives for exactly one construction call.
pub(crate) struct Dag {
    nodes: Vec<Node>,
    leaves: HashMap<Label, NodeId>,
    empty: Option<NodeId>,
    delayed: Vec<NodeId>,
    root: NodeId,
}

impl Dag {
    pub fn new(re: &Rc<Regexp>) -> Self {
        let mut dag = Dag {
            nodes: vec![Node {
                ewp: true,
                ..Node::default()
            }],
            leaves: HashMap::new(),
            empty: None,
            delayed: Vec::new(),
            root: EPS,
        };
        dag.root = dag.intern(re);
        dag
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn intern(&mut self, re: &Rc<Regexp>) -> NodeId {
        match &**re {
            Regexp::Epsilon | Regexp::Anchor(_) => EPS,
            Regexp::EmptySet => self.empty_node(),
            Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => {
                match crate::construct::leaf_label(re) {
                    Some(label) => self.leaf_node(label),
                    None => self.empty_node(),
                }
            }
            Regexp::Concat(l, r) => {
                let a = self.intern(l);
                let b = self.intern(r);
                self.concat_node(a, b, false)
            }
            Regexp::Disj(l, r) => {
                let a = self.intern(l);
                let b = self.intern(r);
                self.disj_node(a, b)
            }
            Regexp::Star(a) => {
                let arg = self.intern(a);
                self.star_node(arg)
            }
            Regexp::Opt(a) => {
                let arg = self.intern(a);
                self.option_node(arg)
            }
        }
    }

    fn empty_node(&mut self) -> NodeId {
        if let Some(id) = self.empty {
            return id;
        }
        let id = self.push(Node::default());
        self.empty = Some(id);
        id
    }

    fn leaf_node(&mut self, label: Label) -> NodeId {
        if let Some(&id) = self.leaves.get(&label) {
            return id;
        }
        let mut diff = Diff::new();
        diff.entry(label.clone()).or_default().insert(EPS);
        let id = self.push(Node {
            diff,
            ..Node::default()
        });
        self.leaves.insert(label, id);
        id
    }

    fn concat_node(&mut self, a: NodeId, b: NodeId, delay: bool) -> NodeId {
        if a == EPS {
            return b;
        }
        if b == EPS {
            return a;
        }
        // an existing concat of exactly (a, b) is a left-edge of a and a
        // right-edge of b
        if let Some(id) = self.nodes[a]
            .dotl
            .intersection(&self.nodes[b].dotr)
            .min()
            .copied()
        {
            return id;
        }
        let ewp = self.nodes[a].ewp && self.nodes[b].ewp;
        let id = self.push(Node {
            ewp,
            concat_args: Some((a, b)),
            ..Node::default()
        });
        self.nodes[a].dotl.insert(id);
        self.nodes[b].dotr.insert(id);
        if delay {
            self.delayed.push(id);
        } else {
            let diff = self.concat_diff(a, b);
            self.nodes[id].diff = diff;
        }
        id
    }

    fn concat_diff(&mut self, a: NodeId, b: NodeId) -> Diff {
        let mut diff = self.cat_lf(a, b, false);
        if self.nodes[a].ewp {
            let right = self.nodes[b].diff.clone();
            plus_lf(&mut diff, right);
        }
        diff
    }

    fn disj_node(&mut self, a: NodeId, b: NodeId) -> NodeId {
        if a == b {
            return a;
        }
        if let Some(id) = self.nodes[a]
            .plus
            .intersection(&self.nodes[b].plus)
            .min()
            .copied()
        {
            return id;
        }
        let ewp = self.nodes[a].ewp || self.nodes[b].ewp;
        let mut diff = self.nodes[a].diff.clone();
        plus_lf(&mut diff, self.nodes[b].diff.clone());
        let id = self.push(Node {
            ewp,
            diff,
            ..Node::default()
        });
        self.nodes[a].plus.insert(id);
        self.nodes[b].plus.insert(id);
        id
    }

    fn star_node(&mut self, arg: NodeId) -> NodeId {
        if let Some(id) = self.nodes[arg].star {
            return id;
        }
        let id = self.push(Node {
            ewp: true,
            ..Node::default()
        });
        self.nodes[arg].star = Some(id);
        // concatenations onto the star would need its diff, which is being
        // computed right now: delay them, resolve once the diff is in place
        let diff = self.cat_lf(arg, id, true);
        self.nodes[id].diff = diff;
        self.do_delayed();
        id
    }

    fn option_node(&mut self, arg: NodeId) -> NodeId {
        if let Some(id) = self.nodes[arg].option {
            return id;
        }
        let diff = self.nodes[arg].diff.clone();
        let id = self.push(Node {
            ewp: true,
            diff,
            ..Node::default()
        });
        self.nodes[arg].option = Some(id);
        id
    }

    /// Linear form of `l` with every continuation concatenated onto `r`.
    fn cat_lf(&mut self, l: NodeId, r: NodeId, delay: bool) -> Diff {
        let entries: Vec<(Label, Vec<NodeId>)> = self.nodes[l]
            .diff
            .iter()
            .map(|(label, set)| (label.clone(), set.iter().copied().collect()))
            .collect();
        let mut out = Diff::new();
        for (label, targets) in entries {
            for x in targets {
                let t = if x == EPS {
                    r
                } else {
                    self.concat_node(x, r, delay)
                };
                out.entry(label.clone()).or_default().insert(t);
            }
        }
        out
    }

    fn do_delayed(&mut self) {
        while let Some(id) = self.delayed.pop() {
            if let Some((a, b)) = self.nodes[id].concat_args {
                let diff = self.concat_diff(a, b);
                self.nodes[id].diff = diff;
            }
        }
    }

    /// Flatten the reachable part of the DAG into an automaton in one
    /// traversal.
    pub fn into_nfa(self) -> Nfa {
        let mut nfa = Nfa::new();
        let mut index: IndexMap<NodeId, usize> = IndexMap::new();
        let mut worklist = vec![self.root];

        let start = nfa.add_state();
        nfa.add_initial(start);
        if self.nodes[self.root].ewp {
            nfa.add_final(start);
        }
        index.insert(self.root, start);

        while let Some(node) = worklist.pop() {
            let from = index[&node];
            for (label, targets) in &self.nodes[node].diff {
                for &t in targets {
                    let to = match index.get(&t) {
                        Some(&id) => id,
                        None => {
                            let id = nfa.add_state();
                            if self.nodes[t].ewp {
                                nfa.add_final(id);
                            }
                            index.insert(t, id);
                            worklist.push(t);
                            id
                        }
                    };
                    nfa.add_transition(from, label.clone(), to);
                }
            }
        }
        nfa
    }
}

/// Union of two linear forms.
fn plus_lf(into: &mut Diff, from: Diff) {
    for (label, set) in from {
        into.entry(label).or_default().extend(set);
    }
}
