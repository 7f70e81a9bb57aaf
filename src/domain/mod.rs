// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and enums that define the core concepts
// of the system. No Burn types, no file I/O, no ML code —
// just the vocabulary every other layer speaks.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A text span with its layout metadata, plus the labelled
// training variant
pub mod featured_text;

// Bidirectional label string ↔ class index mapping
pub mod label;

// The error taxonomy shared by every layer
pub mod errors;
