use std::time::Instant;

/// Measures the time it takes to execute a function.
///
/// Returns the result of the function and the time it took to execute it in `μs`.
pub fn measure_time<F: FnOnce() -> T, T>(f: F) -> (T, u128) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed().as_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_time_returns_the_result() {
        let (sum, _) = measure_time(|| (1..=10).sum::<u32>());
        assert_eq!(sum, 55);
    }
}
