//! Simulation core for a Stochastic Hybrid Petri Net modelling tool:
//! a validated marking model, a closed-catalogue formula evaluator for rate
//! and guard expressions, four coexisting transition behaviors (immediate,
//! timed, stochastic, continuous), and a single-threaded step controller
//! that schedules and fires them.

pub mod behavior;
pub mod eval;
pub mod model;
pub mod sim;
