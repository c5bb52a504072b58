//! Tests for CLI argument parsing, configuration file merging and validation
