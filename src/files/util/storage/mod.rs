pub mod locks;
pub mod service;
