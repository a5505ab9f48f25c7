//! # samspel-api
//!
//! Interface surface between the time-management core and the federates it
//! drives. A *federate* is an independent simulation component (traffic,
//! network, application logic, protocol bridges) that advances its own clock
//! and exchanges timed interactions through the shared simulation time axis.
//!
//! This crate defines the contracts only; the scheduling strategies live in
//! `samspel-rti`.

pub mod error;
pub mod event;
pub mod federate;
pub mod monitor;
pub mod registry;
pub mod time;

pub use error::{FederateError, SchedulerError};
pub use event::{FederateEvent, FederateId};
pub use federate::Federate;
pub use monitor::{Monitor, NoopMonitor};
pub use registry::{FederationRegistry, LocalFederation};
