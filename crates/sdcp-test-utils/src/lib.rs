//! Shared fixtures for the SDCP integration tests
//!
//! [`FakeDevice`] plays the printer side of the WebSocket channel on loopback.
//! Its behaviour can be changed while sessions are connected to it.

mod device;

pub use device::FakeDevice;

use std::time::Duration;
use tokio::time::Instant;

/// How often [`eventually`] re-evaluates its condition
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A loopback TCP port nothing is listening on right now
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("loopback bind")
}

/// Poll `check` until it holds or `within` runs out.
///
/// Returns whether the condition was observed.
pub async fn eventually(within: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + within;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
