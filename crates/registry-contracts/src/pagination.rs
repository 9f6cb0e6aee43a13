//! Enumeration of on-chain lists exposed as an indexed accessor.
//!
//! The registry contracts expose their lists (registers of an organisation,
//! organisations of an owner) as `f(index)` without a length. Reading past
//! the end reverts, so enumeration walks indices from zero and stops at the
//! first failure of any kind.

use futures::stream::{self, Stream, StreamExt};
use std::fmt::Display;
use std::future::Future;

/// Forward-only walk over an indexed accessor.
///
/// Every index is read at most once and the walk cannot be restarted; a
/// fresh enumerator starts again from index zero.
pub struct PaginatedEnumerator<F> {
	accessor: F,
	next_index: Option<u64>,
}

impl<F, Fut, T, E> PaginatedEnumerator<F>
where
	F: FnMut(u64) -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: Display,
{
	pub fn new(accessor: F) -> Self {
		Self {
			accessor,
			next_index: Some(0),
		}
	}

	/// Reads the next element, or returns `None` once the list is exhausted.
	///
	/// A failed read ends the enumeration. Exhausted enumerators return
	/// `None` without touching the accessor again.
	pub async fn next_item(&mut self) -> Option<T> {
		let index = self.next_index?;
		match (self.accessor)(index).await {
			Ok(item) => {
				self.next_index = index.checked_add(1);
				Some(item)
			}
			Err(e) => {
				tracing::trace!(index, "Enumeration ended: {}", e);
				self.next_index = None;
				None
			}
		}
	}

	/// Number of elements read so far.
	pub fn position(&self) -> Option<u64> {
		self.next_index
	}

	/// Converts the walk into a lazy stream; dropping the stream abandons it.
	pub fn into_stream(self) -> impl Stream<Item = T> {
		stream::unfold(self, |mut enumerator| async move {
			let item = enumerator.next_item().await?;
			Some((item, enumerator))
		})
		.fuse()
	}
}

/// Shorthand for `PaginatedEnumerator::new(accessor).into_stream()`.
pub fn enumerate<F, Fut, T, E>(accessor: F) -> impl Stream<Item = T>
where
	F: FnMut(u64) -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: Display,
{
	PaginatedEnumerator::new(accessor).into_stream()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU64, Ordering};
	use std::sync::Arc;

	fn list_of(len: u64, calls: Arc<AtomicU64>) -> impl FnMut(u64) -> futures::future::Ready<Result<u64, String>> {
		move |index| {
			calls.fetch_add(1, Ordering::SeqCst);
			futures::future::ready(if index < len {
				Ok(index * 10)
			} else {
				Err("execution reverted".to_string())
			})
		}
	}

	#[tokio::test]
	async fn test_yields_every_element_once() {
		for len in [0u64, 1, 5] {
			let calls = Arc::new(AtomicU64::new(0));
			let items: Vec<u64> = enumerate(list_of(len, calls.clone())).collect().await;
			assert_eq!(items, (0..len).map(|i| i * 10).collect::<Vec<_>>());
			// One extra read to hit the end
			assert_eq!(calls.load(Ordering::SeqCst), len + 1);
		}
	}

	#[tokio::test]
	async fn test_exhausted_enumerator_stays_exhausted() {
		let calls = Arc::new(AtomicU64::new(0));
		let mut enumerator = PaginatedEnumerator::new(list_of(2, calls.clone()));
		assert_eq!(enumerator.next_item().await, Some(0));
		assert_eq!(enumerator.next_item().await, Some(10));
		assert_eq!(enumerator.next_item().await, None);
		assert_eq!(enumerator.next_item().await, None);
		assert_eq!(enumerator.position(), None);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn test_failure_ends_enumeration() {
		let mut enumerator = PaginatedEnumerator::new(|index: u64| async move {
			match index {
				2 => Err("network error"),
				_ => Ok(index),
			}
		});
		assert_eq!(enumerator.next_item().await, Some(0));
		assert_eq!(enumerator.next_item().await, Some(1));
		assert_eq!(enumerator.next_item().await, None);
		// Later indices are never read even though they would succeed
		assert_eq!(enumerator.next_item().await, None);
	}

	#[tokio::test]
	async fn test_abandoned_stream_stops_reading() {
		let calls = Arc::new(AtomicU64::new(0));
		let first: Vec<u64> = enumerate(list_of(100, calls.clone())).take(3).collect().await;
		assert_eq!(first, vec![0, 10, 20]);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}
}
