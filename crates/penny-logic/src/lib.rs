//! Pure household-economy logic for Penny World.
//!
//! This crate contains all game rules that are independent of any renderer,
//! ECS, or runtime. Functions take plain data and return results, making
//! them unit-testable and portable across the engine, the headless harness,
//! and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`advice`] | Plain-text context for the money coach |
//! | [`avatar`] | Avatar size/speed as pure functions of funds, easing helpers |
//! | [`config`] | Game configuration (durations, capacities, world size) |
//! | [`generation`] | Task definitions, payload parsing, normalization, fallback set |
//! | [`ledger`] | Two-account ledger with bounded transaction log |
//! | [`money`] | Minor units, accounts, formatting and boundary parsing |
//! | [`month`] | Month epochs and end-of-month summaries |
//! | [`tasks`] | Task records, status lifecycle, registry and rent invariant |
//! | [`time`] | Millisecond timestamps and epoch windows |
//! | [`world`] | World bounds and fixed landmarks |

pub mod advice;
pub mod avatar;
pub mod config;
pub mod generation;
pub mod ledger;
pub mod money;
pub mod month;
pub mod tasks;
pub mod time;
pub mod world;
