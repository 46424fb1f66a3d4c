// Application boundaries: ports implemented by the infrastructure adapters

pub mod ports;
