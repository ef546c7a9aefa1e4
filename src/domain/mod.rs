// Domain layer: directory records and the port to the import collaborator.

pub mod model;
pub mod ports;
