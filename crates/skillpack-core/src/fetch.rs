//! Downloading the skill archive.

use crate::config::FetchPolicy;
use crate::error::FetchError;
use std::io::Read;
use std::time::Duration;

const USER_AGENT: &str = concat!("skillpack/", env!("CARGO_PKG_VERSION"));

/// Source of archive bytes. The installer only talks to this trait so tests
/// can count or fail fetches without a network.
pub trait ArchiveFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: ArchiveFetcher + ?Sized> ArchiveFetcher for &F {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP(S) fetcher with bounded retries.
pub struct HttpFetcher {
    agent: ureq::Agent,
    policy: FetchPolicy,
}

impl HttpFetcher {
    pub fn new(policy: FetchPolicy) -> Self {
        let mut builder = ureq::AgentBuilder::new().user_agent(USER_AGENT);
        if policy.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(policy.timeout_secs));
        }
        Self {
            agent: builder.build(),
            policy,
        }
    }

    fn fetch_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(t)) => return Err(FetchError::Transport(t.to_string())),
        };

        let limit = self.policy.max_bytes;
        let mut body = Vec::new();
        response
            .into_reader()
            .take(limit.saturating_add(1))
            .read_to_end(&mut body)?;
        if body.len() as u64 > limit {
            return Err(FetchError::TooLarge { limit });
        }
        Ok(body)
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let body = with_retries(&self.policy, url, |_| self.fetch_once(url))?;
        tracing::info!(url, bytes = body.len(), "downloaded archive");
        Ok(body)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts run out. `op` receives the 1-based attempt number.
pub fn with_retries<T>(
    policy: &FetchPolicy,
    url: &str,
    mut op: impl FnMut(u32) -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(url, attempt, error = %e, "download failed, retrying");
                let backoff = backoff_for(policy, attempt);
                if !backoff.is_zero() {
                    std::thread::sleep(backoff);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Linear backoff, saturating for very large configured delays.
fn backoff_for(policy: &FetchPolicy, attempt: u32) -> Duration {
    Duration::from_millis(policy.backoff_ms.saturating_mul(u64::from(attempt)))
}
