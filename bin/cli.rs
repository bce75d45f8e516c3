use std::env;
use std::fs;
use std::process::ExitCode;

use automalab::{Machine, Simulator};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: automalab_cli <machine.json|machine.jff> [input-string ...]");
        return ExitCode::FAILURE;
    };
    let inputs: Vec<String> = args.collect();

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("cannot read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let is_xml = path.ends_with(".jff") || path.ends_with(".xml");
    let machine = if is_xml {
        Machine::from_interchange_xml(&text)
    } else {
        Machine::from_json(&text)
    };
    let machine = match machine {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("cannot load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{}: {} states, {} transitions, alphabet {:?}",
        machine.kind().tag(),
        machine.state_count(),
        machine.transition_count(),
        machine.alphabet().iter().collect::<String>()
    );

    let report = machine.validate();
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    if !report.is_valid() {
        for error in &report.errors {
            eprintln!("error: {error}");
        }
        return ExitCode::FAILURE;
    }

    let simulator = Simulator::new(machine);
    for input in &inputs {
        match simulator.test_string(input) {
            Ok(outcome) => {
                let verdict = if outcome.accepted { "accept" } else { "reject" };
                println!("{input:?}: {verdict}");
                for entry in &outcome.trace {
                    let mut line = format!(
                        "  [{}] {} | remaining {:?} | {}",
                        entry.step, entry.states, entry.remaining_input, entry.description
                    );
                    if let Some(stack) = &entry.stack {
                        line.push_str(&format!(" | stack {stack}"));
                    }
                    if let (Some(tape), Some(head)) = (&entry.tape, entry.head) {
                        line.push_str(&format!(" | tape {tape} @ {head}"));
                    }
                    println!("{line}");
                }
            }
            Err(e) => {
                eprintln!("{input:?}: test failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if inputs.is_empty() {
        println!("no inputs given; model loaded and validated");
    }

    ExitCode::SUCCESS
}
