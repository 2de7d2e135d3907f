// Deterministic text heuristics behind every fallback path.
// Pure functions only: no LLM calls, no I/O.

pub mod copy_detector;
pub mod gate;
pub mod normalizer;
pub mod tags;
pub mod truncator;
