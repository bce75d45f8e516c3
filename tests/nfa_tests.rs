use automalab::{ActiveConfigs, Label, Machine, State, Transition, Verdict};

/// The `a*b` NFA with ε: q0 --ε--> q1, q1 --a--> q1, q1 --b--> q2(final).
fn a_star_b() -> Machine {
    let mut machine = Machine::nfa();
    let q0 = machine.add_state(State::new("q0", 0.0, 0.0));
    let q1 = machine.add_state(State::new("q1", 120.0, 0.0));
    let q2 = machine.add_state(State::new("q2", 240.0, 0.0).accepting());
    machine.add_transition(Transition::new(q0, q1, Label::epsilon()));
    machine.add_transition(Transition::new(q1, q1, Label::symbols(['a'])));
    machine.add_transition(Transition::new(q1, q2, Label::symbols(['b'])));
    machine
}

#[test]
fn test_a_star_b_accepts() {
    let mut machine = a_star_b();
    assert!(machine.accepts("b"));
    assert!(machine.accepts("ab"));
    assert!(machine.accepts("aaab"));
}

#[test]
fn test_a_star_b_rejects() {
    let mut machine = a_star_b();
    assert!(!machine.accepts(""));
    assert!(!machine.accepts("a"));
    assert!(!machine.accepts("ba"));
}

#[test]
fn test_init_takes_epsilon_closure() {
    let mut machine = a_star_b();
    machine.init_simulation("b");
    let ActiveConfigs::Finite(active) = &machine.sim.active else {
        panic!("finite active set expected");
    };
    // ε-closure of {q0} is {q0, q1}
    assert_eq!(active.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_dead_symbol_rejects() {
    let mut machine = a_star_b();
    machine.init_simulation("x");
    machine.step();
    assert_eq!(machine.sim.verdict, Verdict::Rejected);
}

#[test]
fn test_no_mid_input_acceptance() {
    let mut machine = a_star_b();
    machine.init_simulation("ba");
    // consume 'b': q2 is active and final, but input remains
    machine.step();
    assert_eq!(machine.sim.verdict, Verdict::Undecided);
    machine.run_default();
    assert_eq!(machine.sim.verdict, Verdict::Rejected);
}

#[test]
fn test_subset_construction_equivalence() {
    let mut nfa = a_star_b();
    let mut dfa = nfa.to_dfa().expect("NFA determinizes");
    for input in ["", "a", "b", "ab", "aaab", "ba"] {
        assert_eq!(
            nfa.accepts(input),
            dfa.accepts(input),
            "NFA and subset DFA disagree on {input:?}"
        );
    }
}

#[test]
fn test_subset_construction_shape() {
    let nfa = a_star_b();
    let dfa = nfa.to_dfa().unwrap();
    // {q0,q1} --a--> {q1} --b--> {q2}
    let initial = dfa.initial_state().unwrap();
    assert_eq!(initial.name, "{q0, q1}");
    assert!(dfa.states().any(|s| s.name == "{q2}" && s.is_final));
    let report = dfa.validate();
    assert!(report.is_valid());
}

#[test]
fn test_unreachable_warning_follows_epsilon() {
    let mut machine = a_star_b();
    let island = machine.add_state(State::new("island", 0.0, 200.0));
    machine.add_transition(Transition::new(island, 0, Label::symbols(['a'])));
    let report = machine.validate();
    // island points into the machine but nothing reaches it
    assert!(report.warnings.iter().any(|w| w.contains("island")));
    assert!(!report.warnings.iter().any(|w| w.contains("q1")));
}
