//! CLI commands.

mod build;

pub(crate) use build::BuildArgs;
