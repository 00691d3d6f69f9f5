//! `all` and `race`.
//!
//! Neither combinator cancels anything: elements that lose a race, or that
//! settle after `all` has already rejected, run to completion and their
//! outcome is dropped.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Promise, Resolution};
use crate::scheduler::Scheduler;

/// Positional results collected by `all`.
struct Gather<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

impl<T> Gather<T> {
    fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
            remaining: len,
        }
    }

    /// Stores `value` at `index`; returns every value once the last one arrives.
    fn record(&mut self, index: usize, value: T) -> Option<Vec<T>> {
        if self.slots[index].replace(value).is_none() {
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            Some(std::mem::take(&mut self.slots).into_iter().flatten().collect())
        } else {
            None
        }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Fulfills with every element's value, in input order, once all of them
    /// fulfilled; rejects with the first rejection.
    ///
    /// Empty input fulfills with an empty vector.
    pub fn all<I>(scheduler: &Scheduler, items: I) -> Promise<Vec<T>, E>
    where
        I: IntoIterator<Item = Resolution<T, E>>,
    {
        let items: Vec<Resolution<T, E>> = items.into_iter().collect();
        let element_scheduler = scheduler.clone();

        Promise::new(scheduler, move |resolver| {
            if items.is_empty() {
                resolver.resolve(Vec::new());
                return Ok(());
            }

            let gather = Arc::new(Mutex::new(Gather::new(items.len())));
            for (index, item) in items.into_iter().enumerate() {
                let gather = Arc::clone(&gather);
                let on_value = resolver.clone();
                let on_reason = resolver.clone();
                Promise::resolve_with(&element_scheduler, item).then_or_else(
                    move |value| {
                        let finished = gather.lock().record(index, value);
                        if let Some(values) = finished {
                            on_value.resolve(values);
                        }
                        Ok(())
                    },
                    move |reason| {
                        on_reason.reject(reason);
                        Ok(())
                    },
                );
            }
            Ok(())
        })
    }

    /// Settles like whichever element settles first.
    ///
    /// Empty input never settles.
    pub fn race<I>(scheduler: &Scheduler, items: I) -> Promise<T, E>
    where
        I: IntoIterator<Item = Resolution<T, E>>,
    {
        let items: Vec<Resolution<T, E>> = items.into_iter().collect();
        let element_scheduler = scheduler.clone();

        Promise::new(scheduler, move |resolver| {
            for item in items {
                let on_value = resolver.clone();
                let on_reason = resolver.clone();
                Promise::resolve_with(&element_scheduler, item).then_or_else(
                    move |value| {
                        on_value.resolve(value);
                        Ok(())
                    },
                    move |reason| {
                        on_reason.reject(reason);
                        Ok(())
                    },
                );
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_keeps_input_order() {
        let mut gather = Gather::new(3);
        assert_eq!(gather.record(2, "c"), None);
        assert_eq!(gather.record(0, "a"), None);
        assert_eq!(gather.record(1, "b"), Some(vec!["a", "b", "c"]));
    }

    #[test]
    fn test_gather_counts_each_slot_once() {
        let mut gather = Gather::new(2);
        assert_eq!(gather.record(0, 1), None);
        assert_eq!(gather.record(0, 2), None);
        assert_eq!(gather.record(1, 3), Some(vec![2, 3]));
    }
}
