//! HTTP middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Audit logger: every request, identity when the gate found one
//! 2. Session gate: protected routes only, redirects to `/login`

pub mod audit;
pub mod session;
