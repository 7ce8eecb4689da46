//! # Impactor
//!
//! Monte Carlo estimation of the probability that a near-Earth object strikes the Earth
//! during a close approach.
//!
//! The nominal miss distance is perturbed with a Gaussian whose width follows the object's
//! orbit uncertainty class; every trial landing inside the gravitationally focused capture
//! radius counts as an impact. The estimate comes with a Wilson score interval, a binomial
//! standard error and, on demand, a convergence curve over several trial sizes.
//!
//! Modules
//! -----------------
//! * [`physical_model`] – Earth constants and the focused critical radius.
//! * [`uncertainty`] – orbit uncertainty class → fractional position uncertainty.
//! * [`sampler`] – Gaussian miss-distance sampling.
//! * [`estimator`] – impact classification, Wilson interval, standard errors.
//! * [`simulation`] – validated inputs, the simulation pipeline and its result.
//! * [`convergence`] – convergence curves, sequential and parallel.
//! * [`summary`] – report view and risk level of a result.
//! * [`neo_feed`] – NeoWs payloads and CSV records of tracked objects.
//! * [`impactor`] – the [`Impactor`](crate::impactor::Impactor) façade.
pub mod constants;
pub mod convergence;
pub mod estimator;
pub mod impactor;
pub mod impactor_errors;
pub mod neo_feed;
pub mod physical_model;
pub mod sampler;
pub mod simulation;
pub mod summary;
pub mod uncertainty;

pub use crate::impactor::Impactor;
pub use crate::impactor_errors::ImpactorError;
pub use crate::simulation::{SimulationInput, SimulationResult};
