//! AOT compilation tests.
//!
//! Each test compiles a program to an object file, links it with the
//! system C compiler and runs the executable. Tests skip themselves when
//! no linker is available.

pub mod end_to_end;
pub mod util;
