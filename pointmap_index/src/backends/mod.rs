// Copyright 2026 the Pointmap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree backends implementing [`Store`](crate::store::Store).
//!
//! Each backend trades differently between insertion cost, lookup cost, and
//! resilience to degenerate input orders; see the crate docs for guidance on
//! picking one.

pub mod bucket;
pub mod kd;
pub mod octree;
pub mod rebuild;
