pub mod channel_registry;
pub mod connection_limiter;
pub mod stream_prober;
pub mod verification;

pub use channel_registry::{ChannelRegistry, PassGuard};
pub use connection_limiter::{ConnectionHandle, ConnectionLimiter};
pub use stream_prober::{ChannelProbe, HttpStreamProber, StreamFormat};
pub use verification::{PassSummary, VerificationEngine};
