use automalab::{Label, Machine, MachineKind, State, Transition, Verdict};

/// The `(ab)+` DFA: q0 --a--> q1 --b--> q2(final) --a--> q1.
fn ab_plus() -> Machine {
    let mut machine = Machine::dfa();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let q1 = machine.add_state(State::new("q1", 120.0, 0.0));
    let q2 = machine.add_state(State::new("q2", 240.0, 0.0).accepting());
    machine.add_transition(Transition::new(q0, q1, Label::symbols(['a'])));
    machine.add_transition(Transition::new(q1, q2, Label::symbols(['b'])));
    machine.add_transition(Transition::new(q2, q1, Label::symbols(['a'])));
    machine
}

#[test]
fn test_ab_plus_accepts() {
    let mut machine = ab_plus();
    assert!(machine.accepts("ab"));
    assert!(machine.accepts("abab"));
}

#[test]
fn test_ab_plus_rejects() {
    let mut machine = ab_plus();
    assert!(!machine.accepts(""));
    assert!(!machine.accepts("a"));
    assert!(!machine.accepts("abb"));
    assert!(!machine.accepts("ba"));
}

#[test]
fn test_missing_transition_rejects_immediately() {
    let mut machine = ab_plus();
    machine.init_simulation("ba");
    machine.step();
    assert_eq!(machine.sim.verdict, Verdict::Rejected);
    let last = machine.sim.trace.last().unwrap();
    assert!(last.description.contains("no transition"));
}

#[test]
fn test_step_highlights_taken_transition() {
    let mut machine = ab_plus();
    machine.init_simulation("ab");
    machine.step();
    let highlighted: Vec<_> = machine.transitions().filter(|t| t.highlighted).collect();
    assert_eq!(highlighted.len(), 1);
    assert!(highlighted[0].label.accepts('a'));
    // the next step clears the previous snapshot
    machine.step();
    let highlighted: Vec<_> = machine.transitions().filter(|t| t.highlighted).collect();
    assert_eq!(highlighted.len(), 1);
    assert!(highlighted[0].label.accepts('b'));
}

#[test]
fn test_validate_flags_nondeterminism() {
    let mut machine = ab_plus();
    machine.add_transition(Transition::new(0, 2, Label::symbols(['a'])));
    let report = machine.validate();
    assert!(report.errors.iter().any(|e| e.contains("transitions on 'a'")));
}

#[test]
fn test_validate_flags_epsilon() {
    let mut machine = ab_plus();
    machine.add_transition(Transition::new(0, 2, Label::epsilon()));
    let report = machine.validate();
    assert!(report.errors.iter().any(|e| e.contains("ε-transition")));
}

#[test]
fn test_validate_warns_incomplete() {
    let machine = ab_plus();
    let report = machine.validate();
    assert!(report.is_valid());
    // q0 has no transition on 'b'
    assert!(
        report
            .warnings
            .iter()
            .any(|w| w.contains("q0") && w.contains("'b'"))
    );
}

#[test]
fn test_validate_warns_unreachable() {
    let mut machine = ab_plus();
    machine.add_state(State::new("orphan", 0.0, 300.0));
    let report = machine.validate();
    assert!(report.warnings.iter().any(|w| w.contains("orphan")));
}

#[test]
fn test_validate_requires_initial_state() {
    let machine = Machine::dfa();
    let report = machine.validate();
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("initial")));
}

#[test]
fn test_to_nfa_is_structural() {
    let mut machine = ab_plus();
    let mut nfa = machine.to_nfa().expect("DFA converts to NFA");
    assert_eq!(nfa.kind(), MachineKind::Nfa);
    assert_eq!(nfa.state_count(), machine.state_count());
    assert_eq!(nfa.transition_count(), machine.transition_count());
    for input in ["ab", "abab", "", "a", "ba"] {
        assert_eq!(machine.accepts(input), nfa.accepts(input));
    }
}

#[test]
fn test_to_dfa_refused_for_dfa() {
    let machine = ab_plus();
    assert!(machine.to_dfa().is_none());
}
