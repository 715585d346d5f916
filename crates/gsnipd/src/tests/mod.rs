//! End-to-end suites for the daemon.

mod support;
