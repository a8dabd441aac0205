//! Reference physics collaborators for darklimit.
//!
//! These are deliberately small: a standard halo model and spin-independent
//! nuclear-recoil models with contact or long-range mediators. They exist so
//! the limit machinery in `dl-inference` can be driven end to end; any other
//! implementation of the `dl-core` traits works the same way.
//!
//! All quantities are in natural units with `GeV = 1` (see [`units`]).

pub mod halo;
pub mod nucleus;
pub mod spin_independent;
pub mod units;

pub use halo::StandardHalo;
pub use nucleus::Nucleus;
pub use spin_independent::{Mediator, SpinIndependent};
