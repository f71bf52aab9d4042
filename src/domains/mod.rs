// Domain-Driven Organization - one module per screen family

pub mod favorites;
pub mod schedule;
