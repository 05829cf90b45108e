//! Cross-construction properties: every method accepts the same language,
//! and that language agrees with direct derivative membership and with
//! the backtracking oracle.

use antimirov::{parse, to_automaton, Method};

#[ctor::ctor]
fn init() {
    env_logger::init();
}

/// Every word over `alphabet` with length `0..=max_len`.
fn words_up_to(alphabet: &[char], max_len: usize) -> Vec<String> {
    let mut words = vec![String::new()];
    let mut layer = vec![String::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for w in &layer {
            for &c in alphabet {
                let mut e = w.clone();
                e.push(c);
                next.push(e);
            }
        }
        words.extend(next.iter().cloned());
        layer = next;
    }
    words
}

const FIXTURES: &[&str] = &[
    "(0 + 1)*",
    "[01]*",
    "((a b) c)",
    "((a + @epsilon) (a b))",
    "((a b)* a + (a b)*)",
    "(a* b*)",
    "((a)? (b)?)",
    "(((a + b) c)* 0)",
    "([^ab] c)",
    "(@any a)",
    "((a b) c)*",
];

#[test]
fn all_methods_agree_on_membership() {
    let alphabet = ['0', '1', 'a', 'b', 'c'];
    let words = words_up_to(&alphabet, 4);
    for expr in FIXTURES {
        let re = parse(expr).unwrap();
        let automata: Vec<_> = Method::ALL
            .iter()
            .map(|&m| (m, to_automaton(&re, m)))
            .collect();
        for word in &words {
            let expected = automata[0].1.evaluate(word);
            for (method, nfa) in &automata[1..] {
                assert_eq!(
                    nfa.evaluate(word),
                    expected,
                    "{} diverges from {} on {expr} for {word:?}",
                    method.name(),
                    Method::ALL[0].name(),
                );
            }
        }
    }
}

#[test]
fn automata_agree_with_derivative_membership() {
    let alphabet = ['0', '1', 'a', 'b', 'c'];
    let words = words_up_to(&alphabet, 3);
    for expr in FIXTURES {
        let re = parse(expr).unwrap();
        for method in Method::ALL {
            let nfa = to_automaton(&re, method);
            for word in &words {
                assert_eq!(
                    nfa.evaluate(word),
                    re.derivative_match(word),
                    "{} vs derivative on {expr} for {word:?}",
                    method.name(),
                );
            }
        }
    }
}

#[test]
fn backtracking_oracle_agrees_on_samples() {
    let words = ["", "0", "abc", "ab", "abab", "aabb", "c0", "bc0"];
    for expr in FIXTURES {
        let re = parse(expr).unwrap();
        let nfa = to_automaton(&re, Method::Glushkov);
        for word in words {
            assert_eq!(
                nfa.evaluate(word),
                re.matches_backtrack(word),
                "{expr} on {word:?}"
            );
        }
    }
}

#[test]
fn construction_equivalence_survives_compression() {
    let re = parse("(((a b) + (a b))* ((a b) c))").unwrap();
    let mut table = antimirov::SigTable::new();
    let compressed = re.compress(&mut table);
    for method in Method::ALL {
        let plain = to_automaton(&re, method);
        let shared = to_automaton(&compressed, method);
        for word in ["abc", "ababc", "ab", "", "abab"] {
            assert_eq!(
                plain.evaluate(word),
                shared.evaluate(word),
                "{} on {word:?}",
                method.name()
            );
        }
    }
}

#[test]
fn witness_finds_minimal_words() {
    for method in Method::ALL {
        let build = |expr: &str| to_automaton(&parse(expr).unwrap(), method);

        assert_eq!(build("(000)").witness().as_deref(), Some("000"), "{}", method.name());
        assert_eq!(build("(1*)").witness().as_deref(), Some("1"), "{}", method.name());
        assert_eq!(build("((a b) c)").witness().as_deref(), Some("abc"));
        assert_eq!(build("(((a b) c))?").witness().as_deref(), Some("abc"));
        assert_eq!(build("((z + a) + x)").witness().as_deref(), Some("a"));
        assert_eq!(build("[b-fa]*").witness().as_deref(), Some("a"));

        // some length-1 word; the wildcard's least symbol is the space
        let w = build("(@epsilon + @any)").witness();
        assert_eq!(w.map(|w| w.chars().count()), Some(1));

        assert_eq!(build("@empty_set").witness(), None);
        assert_eq!(build("@epsilon").witness(), None);
    }
}

#[test]
fn unicode_membership() {
    let re = parse("((α + β)* 🚀)").unwrap();
    for method in Method::ALL {
        let nfa = to_automaton(&re, method);
        assert!(nfa.evaluate("🚀"), "{}", method.name());
        assert!(nfa.evaluate("αββα🚀"), "{}", method.name());
        assert!(!nfa.evaluate("αβ"), "{}", method.name());
        assert!(!nfa.evaluate("x🚀"), "{}", method.name());
    }
}
