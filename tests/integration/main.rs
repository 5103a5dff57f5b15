//! End-to-end tests against a running server on an ephemeral port.

mod helpers;

mod health_test;
mod ws_test;
