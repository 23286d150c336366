pub mod http_stream;

pub use http_stream::StreamProxy;
