use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::Data;
use crate::error::{DataError, Result};

/// A container of `n` random rows whose x and y both increase.
///
/// Each column is the running sum of uniform draws from `[0, 1)`. A fixed
/// `seed` gives reproducible data; `None` seeds from the operating system.
pub fn gen_rand(n: usize, seed: Option<u64>) -> Result<Data> {
    if n == 0 {
        return Err(DataError::value("n needs to be a positive integer"));
    }
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let mut values = Array2::zeros((n, 2));
    let (mut x, mut y) = (0.0, 0.0);
    for mut row in values.rows_mut() {
        x += rng.random::<f64>();
        y += rng.random::<f64>();
        row[0] = x;
        row[1] = y;
    }
    Data::new(values)
}

/// [`gen_rand`] with `func` applied to the y values.
pub fn gen_rand_with(n: usize, seed: Option<u64>, func: impl Fn(f64) -> f64) -> Result<Data> {
    Ok(gen_rand(n, seed)?.apply_y(func))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_is_reproducible() {
        assert_eq!(gen_rand(20, Some(7)).unwrap(), gen_rand(20, Some(7)).unwrap());
        assert_ne!(gen_rand(20, Some(7)).unwrap(), gen_rand(20, Some(8)).unwrap());
    }

    #[test]
    fn columns_increase() {
        let d = gen_rand(50, Some(1)).unwrap();
        assert_eq!(d.len(), 50);
        for w in d.x().to_vec().windows(2) {
            assert!(w[1] >= w[0]);
        }
        for w in d.y().to_vec().windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn zero_rows_rejected() {
        assert!(matches!(gen_rand(0, None), Err(DataError::Value(_))));
    }

    #[test]
    fn func_applies_to_y() {
        let plain = gen_rand(5, Some(3)).unwrap();
        let shifted = gen_rand_with(5, Some(3), |y| y + 100.0).unwrap();
        assert_eq!(shifted.x(), plain.x());
        assert_eq!(shifted.y(), plain.y().mapv(|y| y + 100.0));
    }
}
