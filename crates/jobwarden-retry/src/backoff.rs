//! Delay growth functions for retry attempts.

use std::time::Duration;

/// Growth function applied to the base delay for attempt `n` (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayModifier {
    /// `d` for every attempt.
    #[default]
    Constant,
    /// `d * 2^n`.
    Exponential,
    /// `d * fib(n)`, with `fib(0) = fib(1) = 1`.
    Fibonacci,
}

impl DelayModifier {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "expo" | "exponential" => DelayModifier::Exponential,
            "fibo" | "fibonacci" => DelayModifier::Fibonacci,
            _ => DelayModifier::Constant,
        }
    }

    /// Un-jittered, un-capped delay before attempt `n+1` (n is the number
    /// of failed attempts so far, 0-indexed).
    pub fn delay_for(self, base: Duration, n: u32) -> Duration {
        match self {
            DelayModifier::Constant => base,
            DelayModifier::Exponential => base.saturating_mul(1u32.checked_shl(n).unwrap_or(u32::MAX)),
            DelayModifier::Fibonacci => base.saturating_mul(fibonacci(n)),
        }
    }
}

fn fibonacci(n: u32) -> u32 {
    let (mut a, mut b) = (1u32, 1u32);
    for _ in 0..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}
