// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs for the `harbor` binary.
//!
//! The spec files under `cli/` are compiled as integration tests of the
//! `harbor` package (see its `[[test]]` entries) so they can locate the
//! built binary.
