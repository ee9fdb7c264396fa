pub mod singers;
