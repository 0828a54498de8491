//! Sinks consume reconstructed samples in timeline order and are driven by
//! `ExportSession::run`.

/// Sample type, sink trait and built-in sinks.
pub mod sink;
