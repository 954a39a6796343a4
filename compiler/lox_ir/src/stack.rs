//! Stack growth for the recursive tree walkers.
//!
//! Parsing, printing and code generation all recurse once per nesting
//! level, so `((((...))))` or `- - - - 1` with enough depth would overflow
//! a thread stack. Wrapping each recursive step in
//! [`ensure_sufficient_stack`] grows the stack on demand instead.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 64 * 1024;

/// Size of each new stack segment.
const GROW_BY: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROW_BY, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
