//! Arithmetic helpers behind the `/divide` and `/fibonacci` endpoints.

use crate::error::{Result, TrellisError};

/// Largest index whose Fibonacci number fits in a `u128`.
pub const MAX_FIBONACCI_INDEX: i64 = 186;

/// Divide `numerator` by `denominator`.
pub fn divide(numerator: f64, denominator: f64) -> Result<f64> {
    if denominator == 0.0 {
        return Err(TrellisError::InvalidInput("Division by zero".to_string()));
    }

    let result = numerator / denominator;
    if !result.is_finite() {
        return Err(TrellisError::InvalidInput(
            "Result is not a finite number".to_string(),
        ));
    }

    Ok(result)
}

/// Compute the `n`th Fibonacci number, with `fibonacci(0) == 0` and `fibonacci(1) == 1`.
pub fn fibonacci(n: i64) -> Result<u128> {
    if n < 0 {
        return Err(TrellisError::InvalidInput(
            "Input must be a non-negative integer".to_string(),
        ));
    }
    if n > MAX_FIBONACCI_INDEX {
        return Err(TrellisError::InvalidInput(format!(
            "Input must be at most {}",
            MAX_FIBONACCI_INDEX
        )));
    }
    if n <= 1 {
        return Ok(n as u128);
    }

    let (mut a, mut b) = (0u128, 1u128);
    for _ in 2..=n {
        let next = a + b;
        a = b;
        b = next;
    }

    Ok(b)
}
