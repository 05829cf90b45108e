//! Boundary-transform properties: containment of padded words, anchor
//! legality, and the one-shot discipline, end to end through `Pattern`.

use antimirov::{Method, Pattern, PatternError};

fn partial_automaton(expr: &str, method: Method) -> antimirov::Nfa {
    let mut pattern = Pattern::parse(expr).unwrap();
    pattern.partial_match(false).unwrap();
    pattern.to_automaton(method.name()).unwrap()
}

#[test]
fn partial_match_accepts_padded_words() {
    let cases = [
        ("((a b) c)", vec!["abc"]),
        ("(0 + 1)*", vec!["", "0", "10"]),
        ("([0-9] [0-9])", vec!["42", "07"]),
    ];
    let paddings = ["", "x", "xy", " padded "];
    for (expr, accepted) in cases {
        let exact = Pattern::parse(expr)
            .unwrap()
            .to_automaton("pd")
            .unwrap();
        for method in Method::ALL {
            let widened = partial_automaton(expr, method);
            for w in &accepted {
                assert!(exact.evaluate(w), "{expr} should accept {w:?} exactly");
                for p in paddings {
                    for s in paddings {
                        let padded = format!("{p}{w}{s}");
                        assert!(
                            widened.evaluate(&padded),
                            "{} on {expr}: {padded:?}",
                            method.name()
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn partial_match_still_rejects_broken_words() {
    let nfa = partial_automaton("((a b) c)", Method::Glushkov);
    assert!(!nfa.evaluate("ab c"));
    assert!(!nfa.evaluate("acb"));
    assert!(!nfa.evaluate(""));
}

#[test]
fn single_symbol_matches_inside_padding() {
    let nfa = partial_automaton("a", Method::PartialDerivative);
    assert!(nfa.evaluate("   a"));
    assert!(nfa.evaluate("a"));
    assert!(nfa.evaluate("bbbabbb"));
    assert!(!nfa.evaluate("bbb"));
}

#[test]
fn start_anchor_pins_the_left_edge() {
    let mut pattern = Pattern::parse("(<ASTART> (a (b c)))").unwrap();
    pattern.partial_match(false).unwrap();
    let nfa = pattern.to_automaton("pdo").unwrap();
    assert!(nfa.evaluate("abc"));
    assert!(nfa.evaluate("abc trailing"));
    assert!(!nfa.evaluate(" abc"));
}

#[test]
fn end_anchor_pins_the_right_edge() {
    let mut pattern = Pattern::parse("((a (b c)) <AEND>)").unwrap();
    pattern.partial_match(false).unwrap();
    let nfa = pattern.to_automaton("pdo").unwrap();
    assert!(nfa.evaluate("abc"));
    assert!(nfa.evaluate("leading abc"));
    assert!(!nfa.evaluate("abc "));
}

#[test]
fn both_anchors_force_exact_matching() {
    let mut pattern = Pattern::parse("((<ASTART> (a*)) <AEND>)").unwrap();
    pattern.partial_match(false).unwrap();
    let nfa = pattern.to_automaton("follow").unwrap();
    assert!(nfa.evaluate(""));
    assert!(nfa.evaluate("aaa"));
    assert!(!nfa.evaluate("aax"));
}

#[test]
fn misplaced_anchors_are_rejected() {
    for expr in [
        "(a <ASTART>)",
        "(<AEND> a)",
        "((a <ASTART>) b)",
        "((a <AEND>) b)",
        "(a (<ASTART> b))",
    ] {
        match Pattern::parse(expr) {
            Err(PatternError::Anchor(err)) => {
                assert_eq!(err.expression, expr);
            }
            other => panic!("{expr}: expected an anchor error, got {other:?}"),
        }
    }
}

#[test]
fn partial_match_is_one_shot_until_forced() {
    let mut pattern = Pattern::parse("((a b) c)").unwrap();
    let first = pattern.partial_match(false).unwrap().to_string();
    assert!(pattern.partial_match(false).is_err());
    let forced = pattern.partial_match(true).unwrap().to_string();
    assert_eq!(first, forced);
}
