pub mod diff;
pub mod list;
pub mod synth;
pub mod tags;
pub mod validate;
