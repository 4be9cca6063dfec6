pub mod envelope;
pub mod location;

// Re-exports for convenience
pub use envelope::Envelope;
pub use location::Location;
