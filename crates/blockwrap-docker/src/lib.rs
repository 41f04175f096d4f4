//! Container runtime access for blockwrap.
//!
//! Everything that talks to the docker daemon goes through the
//! [`DockerExecutor`] trait so the packaging pipeline can be exercised
//! without a daemon.

pub mod client;
pub mod docker;
pub mod executor;
pub mod inspect;

pub use client::{
    BuildError, CheckResult, DockerClient, DoctorReport, IntrospectionError, PullPolicy,
};
pub use executor::{DockerExecutor, RealExecutor};
pub use inspect::{ImageDefaults, OsRelease};
