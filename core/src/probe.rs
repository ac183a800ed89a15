//! # Reachability Prober
//!
//! One echo probe per address, one hard deadline per probe. The system
//! `ping` does the actual ICMP work so no raw socket privileges are needed;
//! its output is parsed by a pure function kept separate from the
//! invocation. A host that does not answer is a negative result, never an
//! error.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::trace;

use hopmap_common::error::DiscoveryError;
use hopmap_common::network::addr;

/// Extra slack on top of ping's own deadline before the child is killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Outcome of probing a single address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub latency_ms: Option<u32>,
}

impl ProbeOutcome {
    pub const UNREACHABLE: ProbeOutcome = ProbeOutcome {
        reachable: false,
        latency_ms: None,
    };

    pub fn reachable(latency_ms: u32) -> Self {
        Self {
            reachable: true,
            latency_ms: Some(latency_ms),
        }
    }
}

/// Seam for echo probing.
///
/// `Err` is reserved for rejected input; an unanswered probe is
/// `Ok(UNREACHABLE)`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str) -> Result<ProbeOutcome, DiscoveryError>;
}

/// Probes via the system `ping` binary.
pub struct PingProber {
    timeout: Duration,
}

impl PingProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, address: &str) -> Result<ProbeOutcome, DiscoveryError> {
        // Mandatory gate: router tables and kernel caches feed addresses
        // back in here, and the string is about to become an argv entry.
        let target = addr::parse_dotted_quad(address)?;

        let deadline_secs = self.timeout.as_secs().max(1).to_string();
        let child = Command::new("ping")
            .args(["-n", "-c", "1", "-W", &deadline_secs])
            .arg(target.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout + KILL_GRACE, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                // Transport failure ranks with a timeout: negative result.
                trace!(%target, %err, "could not invoke ping");
                return Ok(ProbeOutcome::UNREACHABLE);
            }
            Err(_) => {
                trace!(%target, "ping exceeded hard deadline");
                return Ok(ProbeOutcome::UNREACHABLE);
            }
        };

        if !output.status.success() {
            return Ok(ProbeOutcome::UNREACHABLE);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_echo_latency(&stdout) {
            Some(latency_ms) => Ok(ProbeOutcome::reachable(latency_ms)),
            None => Ok(ProbeOutcome::UNREACHABLE),
        }
    }
}

/// Extracts the round-trip time from ping output.
///
/// Looks for the first `time=` field, rounds to the nearest millisecond and
/// floors at 1 ms so a sub-millisecond reply is still distinguishable from
/// "no latency recorded".
pub(crate) fn parse_echo_latency(output: &str) -> Option<u32> {
    let rest = output.split("time=").nth(1)?;
    let value: &str = rest
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .next()?;
    let ms = value.parse::<f64>().ok()?;
    if !ms.is_finite() || ms < 0.0 {
        return None;
    }
    Some((ms.round() as u32).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING_REPLY: &str = "\
PING 192.168.1.7 (192.168.1.7) 56(84) bytes of data.
64 bytes from 192.168.1.7: icmp_seq=1 ttl=64 time=23.4 ms

--- 192.168.1.7 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 23.412/23.412/23.412/0.000 ms
";

    const PING_FAST_REPLY: &str =
        "64 bytes from 10.0.0.1: icmp_seq=1 ttl=255 time=0.045 ms\n";

    const PING_NO_REPLY: &str = "\
PING 192.168.1.250 (192.168.1.250) 56(84) bytes of data.

--- 192.168.1.250 ping statistics ---
1 packets transmitted, 0 received, 100% packet loss, time 0ms
";

    #[test]
    fn latency_is_rounded_to_nearest_millisecond() {
        assert_eq!(parse_echo_latency(PING_REPLY), Some(23));
        assert_eq!(parse_echo_latency("time=23.6 ms"), Some(24));
    }

    #[test]
    fn sub_millisecond_replies_floor_at_one() {
        assert_eq!(parse_echo_latency(PING_FAST_REPLY), Some(1));
        assert_eq!(parse_echo_latency("time=0.4 ms"), Some(1));
    }

    #[test]
    fn missing_time_field_yields_none() {
        assert_eq!(parse_echo_latency(PING_NO_REPLY), None);
        assert_eq!(parse_echo_latency(""), None);
        assert_eq!(parse_echo_latency("time=garbage ms"), None);
    }

    #[tokio::test]
    async fn malformed_address_is_rejected_before_any_probe() {
        let prober = PingProber::new(Duration::from_secs(1));
        let err = prober.probe("192.168.1.1; reboot").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Validation(_)));

        let err = prober.probe("not-an-address").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Validation(_)));
    }
}
