//! Kernel launch helpers.
//!
//! Every element is an independent task with no ordering guarantee and no
//! synchronisation between tasks. With the `rayon` feature tasks run on the
//! global thread pool; without it they run serially in index order, which is
//! one admissible schedule.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Run `kernel(i)` for every `i` in `0..n`.
pub fn for_each_index<F>(n: usize, kernel: F)
where
    F: Fn(usize) + Send + Sync,
{
    #[cfg(feature = "rayon")]
    (0..n).into_par_iter().for_each(kernel);
    #[cfg(not(feature = "rayon"))]
    (0..n).for_each(kernel);
}

/// Run `kernel(i, &mut values[i])` for every element.
pub fn for_each_mut<T, F>(values: &mut [T], kernel: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Send + Sync,
{
    #[cfg(feature = "rayon")]
    values
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, v)| kernel(i, v));
    #[cfg(not(feature = "rayon"))]
    values
        .iter_mut()
        .enumerate()
        .for_each(|(i, v)| kernel(i, v));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_index_runs_once() {
        let hits: Vec<AtomicUsize> = (0..64).map(|_| AtomicUsize::new(0)).collect();
        for_each_index(hits.len(), |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn mut_kernel_sees_its_index() {
        let mut v = vec![0usize; 16];
        for_each_mut(&mut v, |i, x| *x = i * 2);
        assert_eq!(v[7], 14);
    }
}
