//! The interchange XML dialect understood by the established desktop
//! tool: `<structure>` wrapping a `<type>` tag and an `<automaton>` of
//! `<state>`/`<transition>` elements.
//!
//! Reading goes through `roxmltree`; writing is a small dedicated emitter
//! since the dialect is only a handful of elements deep.

use std::fmt::Write as _;

use crate::core::machine::{Machine, MachineKind};
use crate::core::state::{State, StateId};
use crate::core::transition::{Direction, Label, Transition, TransitionId};
use crate::errors::SerializationError;

impl Machine {
    /// Emits the machine in the interchange dialect. Finite automata (DFA
    /// included) use type `fa` with one `<transition>` element per
    /// accepted symbol.
    #[must_use]
    pub fn to_interchange_xml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
        out.push_str("<structure>\n");
        let _ = writeln!(out, "  <type>{}</type>", type_text(self.kind()));
        out.push_str("  <automaton>\n");

        for state in self.states() {
            let _ = writeln!(
                out,
                "    <state id=\"{}\" name=\"{}\">",
                state.id,
                escape(&state.name)
            );
            let _ = writeln!(out, "      <x>{}</x>", state.x);
            let _ = writeln!(out, "      <y>{}</y>", state.y);
            if state.is_initial {
                out.push_str("      <initial/>\n");
            }
            if state.is_final {
                out.push_str("      <final/>\n");
            }
            out.push_str("    </state>\n");
        }

        for transition in self.transitions() {
            match &transition.label {
                Label::Finite(symbols) if symbols.is_empty() => {
                    write_fa_transition(&mut out, transition, None);
                }
                Label::Finite(symbols) => {
                    for &symbol in symbols {
                        write_fa_transition(&mut out, transition, Some(symbol));
                    }
                }
                Label::Pushdown { read, pop, push } => {
                    out.push_str("    <transition>\n");
                    write_endpoints(&mut out, transition);
                    write_symbol(&mut out, "read", *read);
                    write_symbol(&mut out, "pop", *pop);
                    if push.is_empty() {
                        out.push_str("      <push/>\n");
                    } else {
                        let _ = writeln!(out, "      <push>{}</push>", escape(push));
                    }
                    out.push_str("    </transition>\n");
                }
                Label::Tape {
                    read,
                    write,
                    direction,
                } => {
                    out.push_str("    <transition>\n");
                    write_endpoints(&mut out, transition);
                    write_symbol(&mut out, "read", blank_to_none(*read, self));
                    write_symbol(&mut out, "write", blank_to_none(*write, self));
                    let _ = writeln!(out, "      <move>{}</move>", direction.as_char());
                    out.push_str("    </transition>\n");
                }
            }
        }

        out.push_str("  </automaton>\n");
        out.push_str("</structure>\n");
        out
    }

    /// Loads a machine from the interchange dialect. Type `fa` loads as
    /// an NFA (an inbound DFA is a well-formed NFA). Loading never
    /// records a history entry.
    pub fn from_interchange_xml(text: &str) -> Result<Machine, SerializationError> {
        let document = roxmltree::Document::parse(text)?;
        let root = document.root_element();
        let type_text = root
            .children()
            .find(|n| n.has_tag_name("type"))
            .and_then(|n| n.text())
            .map(str::trim)
            .ok_or(SerializationError::MissingField("type"))?;
        let kind = match type_text {
            "fa" => MachineKind::Nfa,
            "pda" => MachineKind::Pda,
            "turing" => MachineKind::Tm,
            other => return Err(SerializationError::UnknownMachineType(other.to_string())),
        };
        let automaton = root
            .children()
            .find(|n| n.has_tag_name("automaton"))
            .ok_or(SerializationError::MissingField("automaton"))?;

        let mut machine = Machine::new(kind);
        let mut initial_seen = false;
        for node in automaton.children().filter(|n| n.has_tag_name("state")) {
            let id: StateId = parse_required(node.attribute("id"), "state id")?;
            let name = node
                .attribute("name")
                .map_or_else(|| format!("q{id}"), ToOwned::to_owned);
            let mut state = State::new(name, child_f64(&node, "x"), child_f64(&node, "y"));
            state.id = id;
            // The dialect flags initial states inline; only the first one
            // counts.
            if !initial_seen && node.children().any(|n| n.has_tag_name("initial")) {
                state.is_initial = true;
                initial_seen = true;
            }
            state.is_final = node.children().any(|n| n.has_tag_name("final"));
            machine.insert_state_raw(state);
        }

        let mut next_id: TransitionId = 0;
        for node in automaton.children().filter(|n| n.has_tag_name("transition")) {
            let from: StateId = parse_required(child_text(&node, "from"), "transition from")?;
            let to: StateId = parse_required(child_text(&node, "to"), "transition to")?;
            for endpoint in [from, to] {
                if machine.state(endpoint).is_none() {
                    return Err(SerializationError::DanglingEndpoint {
                        transition: next_id,
                        state: endpoint,
                    });
                }
            }
            let label = match kind {
                MachineKind::Dfa | MachineKind::Nfa => {
                    let symbol = child_symbol(&node, "read");
                    if merge_fa_symbol(&mut machine, from, to, symbol) {
                        continue;
                    }
                    Label::Finite(symbol.into_iter().collect())
                }
                MachineKind::Pda => Label::Pushdown {
                    read: child_symbol(&node, "read"),
                    pop: child_symbol(&node, "pop"),
                    push: child_text(&node, "push").unwrap_or_default().to_string(),
                },
                MachineKind::Tm => {
                    let direction_text = child_text(&node, "move")
                        .ok_or(SerializationError::MissingField("move"))?;
                    let direction = direction_text
                        .chars()
                        .next()
                        .and_then(Direction::parse)
                        .ok_or_else(|| SerializationError::InvalidValue {
                            what: "move",
                            value: direction_text.to_string(),
                        })?;
                    Label::Tape {
                        read: child_symbol(&node, "read").unwrap_or('□'),
                        write: child_symbol(&node, "write").unwrap_or('□'),
                        direction,
                    }
                }
            };
            let mut transition = Transition::new(from, to, label);
            transition.id = next_id;
            next_id += 1;
            machine.insert_transition_raw(transition);
        }

        machine.rebuild_alphabet();
        Ok(machine)
    }
}

fn type_text(kind: MachineKind) -> &'static str {
    match kind {
        MachineKind::Dfa | MachineKind::Nfa => "fa",
        MachineKind::Pda => "pda",
        MachineKind::Tm => "turing",
    }
}

fn write_endpoints(out: &mut String, transition: &Transition) {
    let _ = writeln!(out, "      <from>{}</from>", transition.from);
    let _ = writeln!(out, "      <to>{}</to>", transition.to);
}

fn write_fa_transition(out: &mut String, transition: &Transition, symbol: Option<char>) {
    out.push_str("    <transition>\n");
    write_endpoints(out, transition);
    write_symbol(out, "read", symbol);
    out.push_str("    </transition>\n");
}

fn write_symbol(out: &mut String, tag: &str, symbol: Option<char>) {
    match symbol {
        // An empty element is the dialect's ε / blank.
        None => {
            let _ = writeln!(out, "      <{tag}/>");
        }
        Some(c) => {
            let _ = writeln!(out, "      <{tag}>{}</{tag}>", escape(&c.to_string()));
        }
    }
}

fn blank_to_none(symbol: char, machine: &Machine) -> Option<char> {
    let blank = machine.tm_options().map_or('□', |o| o.blank);
    if symbol == blank || symbol == '□' || symbol == '_' {
        None
    } else {
        Some(symbol)
    }
}

/// Folds another `<read>` symbol into an existing finite transition
/// between the same endpoints. ε edges are kept separate and deduplicated.
fn merge_fa_symbol(
    machine: &mut Machine,
    from: StateId,
    to: StateId,
    symbol: Option<char>,
) -> bool {
    let siblings: Vec<(TransitionId, bool)> = machine
        .transitions_between(from, to)
        .filter_map(|t| match &t.label {
            Label::Finite(symbols) => Some((t.id, symbols.is_empty())),
            _ => None,
        })
        .collect();
    match symbol {
        None => siblings.iter().any(|&(_, is_epsilon)| is_epsilon),
        Some(symbol) => match siblings.iter().find(|&&(_, is_epsilon)| !is_epsilon) {
            Some(&(id, _)) => {
                machine.push_fa_symbol(id, symbol);
                true
            }
            None => false,
        },
    }
}

fn child_text<'a>(node: &roxmltree::Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
}

fn child_f64(node: &roxmltree::Node<'_, '_>, tag: &str) -> f64 {
    child_text(node, tag)
        .and_then(|t| t.trim().parse().ok())
        .unwrap_or(0.0)
}

fn child_symbol(node: &roxmltree::Node<'_, '_>, tag: &str) -> Option<char> {
    child_text(node, tag).and_then(|t| t.trim().chars().next())
}

fn parse_required<T: std::str::FromStr>(
    text: Option<&str>,
    what: &'static str,
) -> Result<T, SerializationError> {
    let text = text.ok_or(SerializationError::MissingField(what))?.trim();
    text.parse()
        .map_err(|_| SerializationError::InvalidValue {
            what,
            value: text.to_string(),
        })
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
