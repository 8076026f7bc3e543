// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fixed port-ID ranges prescribed by the transport specification.
//!
//! Subject and service identifiers live in disjoint spaces. Within each
//! space, a band is reserved for the regulated standard namespace (`uavcan`)
//! and another for regulated vendor types; everything else is unregulated
//! and rejected by default. New allocations are granted from the bottom of
//! each band, the top may be consumed by the standard.

/// Highest valid subject identifier.
pub const MAX_SUBJECT_ID: u32 = 8191;

/// Highest valid service identifier.
pub const MAX_SERVICE_ID: u32 = 511;

const STANDARD_ROOT_NAMESPACE: &str = "uavcan";

const STANDARD_SUBJECTS: (u32, u32) = (7168, 8191);
const STANDARD_SERVICES: (u32, u32) = (384, 511);

const VENDOR_SUBJECTS: (u32, u32) = (6144, 7167);
const VENDOR_SERVICES: (u32, u32) = (256, 383);

/// Whether the given fixed subject ID is inside the regulated range that
/// applies to the given root namespace.
pub fn is_valid_regulated_subject_id(regulated_id: u32, root_namespace: &str) -> bool {
    let (lo, hi) = if root_namespace.trim() == STANDARD_ROOT_NAMESPACE {
        STANDARD_SUBJECTS
    } else {
        VENDOR_SUBJECTS
    };
    (lo..=hi).contains(&regulated_id)
}

/// Whether the given fixed service ID is inside the regulated range that
/// applies to the given root namespace.
pub fn is_valid_regulated_service_id(regulated_id: u32, root_namespace: &str) -> bool {
    let (lo, hi) = if root_namespace.trim() == STANDARD_ROOT_NAMESPACE {
        STANDARD_SERVICES
    } else {
        VENDOR_SERVICES
    };
    (lo..=hi).contains(&regulated_id)
}
