// Domain layer: entities, result shapes, the query builder and the entity view port.

pub mod model;
pub mod ports;
pub mod query;
