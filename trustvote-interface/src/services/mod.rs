//! The `services` module defines the capabilities a client consumes from the
//! outside world: the voting contract (read and write sides) and the
//! content-addressed storage used for candidate photos.
//!
//! Implementations may perform network I/O and are expected to be cheap to
//! share between views.
pub mod contract;
pub mod storage;
