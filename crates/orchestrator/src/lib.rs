//! Turn orchestration: the state machine that sequences extraction,
//! intent planning, routing, and task execution, with per-thread
//! conversation memory.

pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod planner;
pub mod router;
pub mod state;
pub mod tasks;

pub use error::TurnError;
pub use extract::AttachmentKind;
pub use orchestrator::Orchestrator;
pub use planner::{load_planner_prompt, DEFAULT_PLANNER_PROMPT, PLANNER_EXTRACT_LIMIT};
pub use router::{route, Route};
pub use state::{Stage, TurnOutcome, TurnState};
