//! Ulam spiral of Miller-Rabin probable primes, drawn incrementally.
//!
//! [`primality`] and [`spiral`] are pure. [`stepper::SteppingLoop`] is the
//! only stateful piece: a pass over the spiral that a host resumes between
//! frames until it is done or superseded through its [`pass::PassSlot`].

pub mod canvas;
pub mod config;
pub mod error;
pub mod pass;
pub mod primality;
pub mod rule;
pub mod spiral;
pub mod stepper;

pub use config::PassParams;
pub use error::PassError;
pub use primality::is_probably_prime;
pub use spiral::{cell_offset, Offset, Viewport};
pub use stepper::{CellRule, CellSink, Step, SteppingLoop, YieldProbe};
