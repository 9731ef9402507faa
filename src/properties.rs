//! Property-based tests across the subset, converter and parser engines.
