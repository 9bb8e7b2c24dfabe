// State machine module for per-run task execution records
//
// Every task of a run owns one state machine. Transitions only move forward
// (Pending -> Running -> Success | Failed | Cancelled) except for the retry
// edge Failed -> Pending, which the executor takes while attempts remain.

pub mod errors;
pub mod events;
pub mod states;
pub mod task_state_machine;

pub use errors::{StateMachineError, StateMachineResult};
pub use events::TaskRunEvent;
pub use states::TaskRunState;
pub use task_state_machine::{TaskStateMachine, TaskTransition};
