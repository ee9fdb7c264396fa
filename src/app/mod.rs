pub mod ports;
pub mod singers_use_case;
