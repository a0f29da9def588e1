// Product source implementations
pub mod http;

pub use http::HttpProductSource;
