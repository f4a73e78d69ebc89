//! Front-end pieces of the command-line tool, exposed for integration tests.
pub mod control_loop;
pub mod interactive;
pub mod relocate;
pub mod report;
