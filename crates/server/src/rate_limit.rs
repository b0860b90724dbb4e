//! Per-connection token-bucket rate limiting for the WebSocket channel.
//!
//! Two independent buckets: one for discrete JSON messages, one for raw
//! audio bytes (scaled by an assumed 4KB/message budget so the audio bucket
//! refills at the same `messages_per_second` rate). `burst_multiplier` sets
//! how many seconds' worth of tokens can accumulate.

use std::time::Instant;
use thiserror::Error;
use voice_agent_config::RateLimitConfig;

const ASSUMED_BYTES_PER_MESSAGE: f64 = 4096.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("message rate limit exceeded")]
    MessageLimit,
    #[error("audio byte rate limit exceeded")]
    AudioLimit,
}

struct Bucket {
    tokens: f64,
    capacity: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(refill_per_sec: f64, burst_multiplier: f32) -> Self {
        let capacity = refill_per_sec * burst_multiplier.max(1.0) as f64;
        Self { tokens: capacity, capacity, refill_per_sec, last_refill: Instant::now() }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    fn take(&mut self, cost: f64) -> bool {
        self.refill();
        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }
}

pub struct RateLimiter {
    enabled: bool,
    messages: Bucket,
    audio_bytes: Bucket,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let messages_per_sec = config.messages_per_second as f64;
        Self {
            enabled: config.enabled,
            messages: Bucket::new(messages_per_sec, config.burst_multiplier),
            audio_bytes: Bucket::new(messages_per_sec * ASSUMED_BYTES_PER_MESSAGE, config.burst_multiplier),
        }
    }

    pub fn check_message(&mut self) -> Result<(), RateLimitError> {
        if !self.enabled || self.messages.take(1.0) {
            Ok(())
        } else {
            Err(RateLimitError::MessageLimit)
        }
    }

    pub fn check_audio(&mut self, bytes: usize) -> Result<(), RateLimitError> {
        if !self.enabled || self.audio_bytes.take(bytes as f64) {
            Ok(())
        } else {
            Err(RateLimitError::AudioLimit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool) -> RateLimitConfig {
        RateLimitConfig { enabled, messages_per_second: 2, burst_multiplier: 1.0 }
    }

    #[test]
    fn allows_burst_up_to_capacity() {
        let mut limiter = RateLimiter::new(config(true));
        assert!(limiter.check_message().is_ok());
        assert!(limiter.check_message().is_ok());
    }

    #[test]
    fn rejects_beyond_capacity() {
        let mut limiter = RateLimiter::new(config(true));
        for _ in 0..2 {
            limiter.check_message().unwrap();
        }
        assert_eq!(limiter.check_message(), Err(RateLimitError::MessageLimit));
    }

    #[test]
    fn disabled_limiter_never_rejects() {
        let mut limiter = RateLimiter::new(config(false));
        for _ in 0..1000 {
            assert!(limiter.check_message().is_ok());
        }
    }

    #[test]
    fn audio_bucket_tracks_bytes_not_messages() {
        let mut limiter = RateLimiter::new(config(true));
        assert!(limiter.check_audio(100).is_ok());
    }
}
