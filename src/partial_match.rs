//! Boundary transform: rewrites a tree so its language becomes
//! "any text · original language · any text", validating anchor legality
//! along the way. The same recursion with padding switched off validates
//! and erases anchors for exact matching.

use crate::regexp::{Anchor, Regexp};
use std::rc::Rc;
use thiserror::Error;

/// An anchor found where its boundary can never coincide with the text
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal {anchor} at `{subtree}` in `{expression}`")]
pub struct AnchorError {
    pub anchor: Anchor,
    /// Printed form of the offending subtree.
    pub subtree: String,
    /// The source text the tree was parsed from.
    pub expression: String,
}

/// Failure of the partial-match transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartialMatchError {
    #[error(transparent)]
    Anchor(#[from] AnchorError),
    #[error("partial-match transform already applied; pass `force` to re-apply")]
    AlreadyApplied,
}

/// Which edges of the current subtree may coincide with the text boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Perm {
    start: bool,
    end: bool,
}

const BOTH: Perm = Perm {
    start: true,
    end: true,
};

/// Rewrite `re` so that it matches anywhere inside surrounding text.
pub fn expand(re: &Rc<Regexp>, expression: &str) -> Result<Rc<Regexp>, AnchorError> {
    rewrite(re, BOTH, true, expression)
}

/// Validate anchor placement and erase legal anchors without padding; the
/// rewrite exact matching runs before automaton construction.
pub fn replace_anchors(re: &Rc<Regexp>, expression: &str) -> Result<Rc<Regexp>, AnchorError> {
    rewrite(re, BOTH, false, expression)
}

fn any_star() -> Rc<Regexp> {
    Rc::new(Regexp::Star(Rc::new(Regexp::Any)))
}

/// Pad a subtree atomically on its permitted edges.
fn pad_edges(re: Rc<Regexp>, perm: Perm, pad: bool) -> Rc<Regexp> {
    if !pad {
        return re;
    }
    let mut out = re;
    if perm.start {
        out = Regexp::concat(any_star(), out);
    }
    if perm.end {
        out = Regexp::concat(out, any_star());
    }
    out
}

fn rewrite(
    re: &Rc<Regexp>,
    perm: Perm,
    pad: bool,
    expression: &str,
) -> Result<Rc<Regexp>, AnchorError> {
    match &**re {
        Regexp::EmptySet => Ok(re.clone()),
        // ε padded on any permitted edge collapses to @any* outright
        Regexp::Epsilon => {
            if pad && (perm.start || perm.end) {
                Ok(any_star())
            } else {
                Ok(re.clone())
            }
        }
        Regexp::Symbol(_) | Regexp::Class(_) | Regexp::Any => Ok(pad_edges(re.clone(), perm, pad)),
        Regexp::Anchor(anchor) => {
            let legal = match anchor {
                Anchor::Start => perm.start,
                Anchor::End => perm.end,
            };
            if legal {
                // the anchor pins its own edge to the text boundary; the
                // opposite edge, if permitted, is still free text
                let residue = match anchor {
                    Anchor::Start => Perm {
                        start: false,
                        end: perm.end,
                    },
                    Anchor::End => Perm {
                        start: perm.start,
                        end: false,
                    },
                };
                Ok(pad_edges(Rc::new(Regexp::Epsilon), residue, pad))
            } else {
                Err(AnchorError {
                    anchor: *anchor,
                    subtree: re.to_string(),
                    expression: expression.to_owned(),
                })
            }
        }
        Regexp::Concat(l, r) => {
            // the boundary permission splits: only the left child may still
            // touch the text start, only the right child the text end
            let left = rewrite(
                l,
                Perm {
                    start: perm.start,
                    end: false,
                },
                pad,
                expression,
            )?;
            let right = rewrite(
                r,
                Perm {
                    start: false,
                    end: perm.end,
                },
                pad,
                expression,
            )?;
            Ok(Regexp::concat(left, right))
        }
        Regexp::Disj(l, r) => Ok(Regexp::disj(
            rewrite(l, perm, pad, expression)?,
            rewrite(r, perm, pad, expression)?,
        )),
        Regexp::Star(arg) | Regexp::Opt(arg) => {
            if arg.contains_anchor() {
                // Padding a repetition whose body pins a text boundary is
                // unsound, and anchors between iterations can never match:
                // only the zero-iterations case and a single anchored
                // occurrence survive. Rewrite to their disjunction.
                let zero = rewrite(&Rc::new(Regexp::Epsilon), perm, pad, expression)?;
                let one = rewrite(arg, perm, pad, expression)?;
                Ok(Regexp::disj(zero, one))
            } else {
                // padding must stay outside the repetition
                Ok(pad_edges(re.clone(), perm, pad))
            }
        }
    }
}
