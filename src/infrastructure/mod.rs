// Infrastructure module - background timing and HTTP plumbing
pub mod heartbeat;
pub mod http;
pub mod timer;

pub use heartbeat::Keepalive;
pub use http::HttpClient;
pub use timer::Timer;
