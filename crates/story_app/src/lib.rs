//! Command-line front ends: the `story_fetch` backend and the `story_digest` caller.
pub mod digest;
pub mod fetch;
