//! Simulation engine for the four classical machine models of
//! formal-language theory: DFA, NFA with ε-transitions, pushdown automata
//! and single-tape Turing machines.
//!
//! The crate provides the abstract machine data model (states,
//! transitions, alphabets, stacks, tapes), per-type validation and step
//! semantics behind a unified [`Machine`] interface, the classical subset
//! construction, a bounded run driver with loop detection, and two
//! serialization forms: a structured JSON record and the interchange XML
//! dialect of the established desktop tool. Rendering and UI concerns
//! live outside; the engine only exposes the geometry and highlight flags
//! they consume.

pub mod core;
pub mod errors;
pub mod io;

pub use self::core::driver::{Simulator, TestOutcome};
pub use self::core::machine::{Machine, MachineKind, PdaOptions, TmOptions, ValidationReport};
pub use self::core::sim::{ActiveConfigs, TraceEntry, Verdict};
pub use self::core::state::{State, StateId};
pub use self::core::transition::{Direction, Label, Transition, TransitionId};
