//! Built-in connectors.
//!
//! Small, self-contained units of work registered by default. Trigger-kind
//! connectors only pass input through; real triggering lives in the trigger
//! subsystem and the HTTP layer.

pub mod ai;
pub mod condition;
pub mod delay;
pub mod discord;
pub mod http;
pub mod math;
pub mod print;
pub mod random;
pub mod trigger;
