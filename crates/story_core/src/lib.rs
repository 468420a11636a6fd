//! Story core: pure backend-invocation logic and the wire contract.
mod candidate;
mod classify;
mod orchestrator;
mod payload;
mod preview;
mod recover;
mod request;

pub use candidate::{
    resolve_candidates, wildcard_matches, BackendRuntime, Candidate, PlatformProbe,
};
pub use classify::{
    dependency_hint, is_interpreter_missing, COMMAND_NOT_FOUND_POSIX, COMMAND_NOT_FOUND_WINDOWS,
};
pub use orchestrator::{
    display_command_line, update, AttemptOutcome, Diagnostics, Fallback, FallbackState,
    InvocationError, Launch, Msg,
};
pub use payload::{InvocationResult, Payload, StoryRecord};
pub use preview::{prepare_preview, MAX_STDOUT_PREVIEW};
pub use recover::{recover_json_object, recover_payload, RecoveryError};
pub use request::{InvocationRequest, DAYS_RANGE, MAX_PAGES_RANGE, MIN_VOTES_RANGE};
