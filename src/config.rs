//! Configuration constants for the report aggregator
//!
//! This module centralizes the fixed values written into result documents and
//! the naming rules shared by the persistence and rendering layers.

// ============================================================================
// Document Naming
// ============================================================================

/// Filename prefix for every persisted per-worker document
pub const DOCUMENT_PREFIX: &str = "WDIO.json.";

/// Filename suffix for every persisted per-worker document
pub const DOCUMENT_SUFFIX: &str = ".json";

/// Label used when a worker reports no sanitized capabilities
pub const UNKNOWN_CAPABILITIES_LABEL: &str = "unknown";

/// Default filename for the merged report handed to the renderer
///
/// Must not match the worker document pattern, or a later merge reads it back.
pub const DEFAULT_REPORT_FILENAME: &str = "wdio-merged-report.json";

// ============================================================================
// Document Defaults
// ============================================================================

pub const COPYRIGHT_YEAR: u32 = 2016;

/// Placeholder suite timeout; the host does not report the real value
pub const SUITE_TIMEOUT_PLACEHOLDER: u64 = 999;

pub const DEFAULT_SPEED: &str = "fast";

pub const DEFAULT_PERCENT_CLASS: &str = "danger";

// ============================================================================
// Merge Configuration
// ============================================================================

/// Amount added to the merged `passPercent` and `pendingPercent` per document
///
/// This is a fixed increment, not a weighted recomputation. Downstream
/// consumers read the merged percentages on this scale.
pub const PERCENT_INCREMENT_PER_DOCUMENT: f64 = 50.0;
