use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

/// Seconds before another verification code may be requested.
pub const RESEND_COOLDOWN_SECS: u32 = 60;

/// Countdown that keeps the resend action disabled while it runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResendCooldown {
    remaining: u32,
}

impl ResendCooldown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.remaining = RESEND_COOLDOWN_SECS;
    }

    /// One second elapsed. Returns true while still counting.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.is_active()
    }

    /// Lowers the countdown to what the wall clock says is left, for callers
    /// that could not tick while suspended.
    pub fn catch_up(&mut self, remaining: u32) {
        self.remaining = self.remaining.min(remaining);
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Text of the resend button.
    #[must_use]
    pub fn label(&self) -> String {
        if self.is_active() {
            format!("Resend in {}s", self.remaining)
        } else {
            "Resend Verification Code".to_string()
        }
    }

    /// Drives the countdown once per second until it reaches zero, reporting
    /// the remaining seconds after each tick. Returns the number of ticks.
    pub async fn run(&mut self, mut on_tick: impl FnMut(u32)) -> u32 {
        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = 0;
        while self.is_active() {
            ticker.tick().await;
            self.tick();
            ticks += 1;
            on_tick(self.remaining);
        }
        debug!(ticks, "resend cooldown finished");
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_follows_state() {
        let mut cooldown = ResendCooldown::new();
        assert_eq!(cooldown.label(), "Resend Verification Code");
        cooldown.start();
        assert_eq!(cooldown.label(), "Resend in 60s");
        cooldown.tick();
        assert_eq!(cooldown.label(), "Resend in 59s");
    }

    #[test]
    fn tick_saturates_at_zero() {
        let mut cooldown = ResendCooldown::new();
        assert!(!cooldown.tick());
        assert_eq!(cooldown.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sixty_ticks_one_second_apart() {
        let mut cooldown = ResendCooldown::new();
        cooldown.start();

        let started = Instant::now();
        let mut seen = Vec::new();
        let ticks = cooldown.run(|remaining| seen.push(remaining)).await;

        assert_eq!(ticks, RESEND_COOLDOWN_SECS);
        assert_eq!(started.elapsed(), Duration::from_secs(60));
        assert_eq!(seen.first(), Some(&59));
        assert_eq!(seen.last(), Some(&0));
        assert!(!cooldown.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_cooldown_finishes_immediately() {
        let mut cooldown = ResendCooldown::new();
        assert_eq!(cooldown.run(|_| {}).await, 0);
    }
}
