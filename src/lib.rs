//! # Microbenthos
//!
//! Building blocks for 1-D reaction-diffusion models of microbial mats and
//! sediments: a cell mesh with a diffusive boundary layer (DBL), per-cell
//! variables built from configuration, and rate processes written as
//! formulas.
//!
//! ## Crate layout
//!
//! - [`domain`]: The [`SedimentDbl`](domain::SedimentDbl) mesh and its
//!   registered cell variables.
//! - [`entity`]: The entity lifecycle, domain attachment, and the
//!   [`Registry`](entity::Registry) that builds entities from config.
//! - [`variable`]: [`Variable`](variable::Variable) entities that create,
//!   seed and constrain a domain variable.
//! - [`process`]: [`ExprProcess`](process::ExprProcess) rate expressions and
//!   their response composition.
//! - [`error`]: The [`ErrorKind`](error::ErrorKind) shared by every module's
//!   error type.
//! - [`support`]: Units, value constraints and logging used across the crate.
//!
//! Modules in [`support`] are public because they're useful, but their APIs
//! are not stable.

pub mod domain;
pub mod entity;
pub mod error;
pub mod process;
pub mod support;
pub mod variable;
