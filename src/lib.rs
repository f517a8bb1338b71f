//! Send commands to Arista switches over eAPI and collect the output.
//!
//! Layers, innermost first: [`domain`] (targets, command classification,
//! output records), [`application`] (input resolution, per-switch dispatch,
//! output routing), [`infrastructure`] (eAPI client, filesystem, console,
//! wiring), [`cli`] (arguments and the run loop).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
