use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::store::{lock, Readable, Subscribers, Unsubscribe};

type Filter<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;
type Compare<S> = Arc<dyn Fn(&S, &S) -> Ordering + Send + Sync>;

/// Identifies a filter added to a [`DataReducer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId(u64);

struct ReducerState<S> {
    source: Vec<Arc<S>>,
    items: Vec<Arc<S>>,
    filters: Vec<(FilterId, Filter<S>)>,
    sort: Option<Compare<S>>,
    next_filter: u64,
}

/// Read-only filtered and sorted view over a collection.
///
/// The view is recomputed every time the owning collection updates its
/// subscribers, and whenever filters or sorting change.
pub struct DataReducer<S> {
    state: Arc<Mutex<ReducerState<S>>>,
    subscribers: Subscribers<[Arc<S>]>,
}

impl<S> Clone for DataReducer<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<S: Send + Sync + 'static> DataReducer<S> {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ReducerState {
                source: Vec::new(),
                items: Vec::new(),
                filters: Vec::new(),
                sort: None,
                next_filter: 0,
            })),
            subscribers: Subscribers::new(),
        }
    }

    /// Keep only entries for which every filter returns `true`.
    pub fn add_filter<F>(&self, filter: F) -> FilterId
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        let id = {
            let mut state = lock(&self.state);
            let id = FilterId(state.next_filter);
            state.next_filter += 1;
            state.filters.push((id, Arc::new(filter)));
            id
        };
        self.recompute();
        id
    }

    pub fn remove_filter(&self, id: FilterId) -> bool {
        let removed = {
            let mut state = lock(&self.state);
            let before = state.filters.len();
            state.filters.retain(|(filter_id, _)| *filter_id != id);
            before != state.filters.len()
        };
        if removed {
            self.recompute();
        }
        removed
    }

    pub fn clear_filters(&self) {
        lock(&self.state).filters.clear();
        self.recompute();
    }

    pub fn set_sort<F>(&self, compare: F)
    where
        F: Fn(&S, &S) -> Ordering + Send + Sync + 'static,
    {
        lock(&self.state).sort = Some(Arc::new(compare));
        self.recompute();
    }

    pub fn clear_sort(&self) {
        lock(&self.state).sort = None;
        self.recompute();
    }

    /// Entries currently visible through the view.
    pub fn items(&self) -> Vec<Arc<S>> {
        lock(&self.state).items.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the source entries and recompute.
    pub(crate) fn refresh(&self, source: Vec<Arc<S>>) {
        lock(&self.state).source = source;
        self.recompute();
    }

    fn recompute(&self) {
        // Filters and sort run outside the lock; they may read the view.
        let (source, filters, sort) = {
            let state = lock(&self.state);
            let filters: Vec<Filter<S>> =
                state.filters.iter().map(|(_, f)| Arc::clone(f)).collect();
            (state.source.clone(), filters, state.sort.clone())
        };

        let mut items: Vec<Arc<S>> = source
            .into_iter()
            .filter(|entry| filters.iter().all(|filter| filter(&**entry)))
            .collect();
        if let Some(compare) = sort {
            items.sort_by(|a, b| compare(&**a, &**b));
        }

        lock(&self.state).items = items.clone();
        self.subscribers.notify(&items);
    }
}

impl<S: Send + Sync + 'static> Readable<[Arc<S>]> for DataReducer<S> {
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&[Arc<S>]) + Send + Sync + 'static,
    {
        let items = self.items();
        handler(&items);
        self.subscribers.add(handler)
    }
}

impl<S> fmt::Debug for DataReducer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("DataReducer")
            .field("source", &state.source.len())
            .field("items", &state.items.len())
            .field("filters", &state.filters.len())
            .field("sorted", &state.sort.is_some())
            .finish()
    }
}
