//! Agent module - orchestration and conversation management
//!
//! Contains the turn loop that coordinates model calls and capability execution.

pub mod conversation;
pub mod loop_state;
pub mod orchestrator;
pub mod session;

pub use conversation::Transcript;
pub use loop_state::{ToolOutcome, TurnLoopState, TurnState};
pub use orchestrator::{Agent, AgentBuilder, TurnOutcome, APOLOGY, EMPTY_ANSWER};
pub use session::{SessionHandle, SessionManager};
