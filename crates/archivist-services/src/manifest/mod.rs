mod service;

pub use service::ManifestEngine;
