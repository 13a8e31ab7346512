// Adapters layer: concrete implementations for external systems (entity view, seed data).

pub mod memory;
pub mod seed;
