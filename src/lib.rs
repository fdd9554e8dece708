//! Entertainment-only size estimator for original character (OC) creation.
//!
//! The numbers come from fixed baseline tables plus uniform random jitter.
//! They carry no medical meaning.
//!
//! - [`tables`]: the lookup tables, embedded and optionally overridden on disk
//! - [`calculator`]: the pure calculation over an injectable random source
//! - [`form`]: form fields, defaults, and the compute/reset lifecycle
//! - [`report`]: display formatting and the plain-text export

pub mod calculator;
pub mod error;
pub mod form;
pub mod report;
pub mod tables;

pub use calculator::{CalcInput, Calculator, Comparison, Measurements, Relation};
pub use error::{Error, Result};
pub use form::{FormState, Phase, Session};
pub use report::Export;
pub use tables::{Tables, load_tables};
