pub mod canvas;
pub mod host;
pub mod store;
