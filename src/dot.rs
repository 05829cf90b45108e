use crate::nfa::Nfa;
use std::io;
use std::io::Write;

impl Nfa {
    pub fn output_dot(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "digraph {{")?;

        for s in 0..self.state_count() {
            let mut attrs = String::new();
            if self.is_final(s) {
                attrs.push_str(", shape=doublecircle");
            }
            if self.initial().contains(&s) {
                attrs.push_str(", penwidth=2");
            }
            writeln!(w, "node[label=\"{s}\"{attrs}] id{s}")?;

            for &t in self.epsilon_targets(s) {
                writeln!(w, "id{s} -> id{t} [label=\"@epsilon\"]")?;
            }
            for (label, targets) in self.labels(s) {
                for &t in targets {
                    writeln!(w, "id{s} -> id{t} [label=\"{label}\"]")?;
                }
            }
        }

        writeln!(w, "}}")?;

        Ok(())
    }
}
