//! Parallel processing utilities.

use rayon::prelude::*;


/// Multiplier for number of chunks relative to CPU threads.
/// Using 3x threads provides good load balancing when some chunks finish faster.
const CHUNKS_PER_THREAD: usize = 3;

/// Number of rows per chunk so that `height` splits into roughly
/// `threads * CHUNKS_PER_THREAD` chunks. Never less than one row.
#[inline]
pub fn rows_per_chunk(height: usize) -> usize {
    let num_chunks = rayon::current_num_threads() * CHUNKS_PER_THREAD;
    (height / num_chunks).max(1)
}

/// Splits a row-major buffer into row-aligned mutable chunks processed in parallel.
///
/// Yields `(first_row, chunk)` where `chunk` holds whole rows of `row_len` elements.
///
/// # Panics
///
/// Panics if `row_len` is zero or does not divide `data.len()`.
pub fn par_rows_mut<T: Send>(
    data: &mut [T],
    row_len: usize,
) -> impl IndexedParallelIterator<Item = (usize, &mut [T])> + '_ {
    assert!(row_len > 0, "row length must be positive");
    assert_eq!(
        data.len() % row_len,
        0,
        "buffer length must be a multiple of the row length"
    );

    let chunk_rows = rows_per_chunk(data.len() / row_len);
    data.par_chunks_mut(row_len * chunk_rows)
        .enumerate()
        .map(move |(idx, chunk)| (idx * chunk_rows, chunk))
}
