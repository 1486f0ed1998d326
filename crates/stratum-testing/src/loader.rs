//! Component loaders for driving async mounts in tests.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_task::LocalFutureObj;
use stratum_core::{ComponentLoader, Imports, LoadError, LoadFuture, Program};

/// Future that is pending once before resolving, like a fetch that
/// completes on a later tick.
struct Deferred<T> {
    value: Option<T>,
    yielded: bool,
}

impl<T: Unpin> Future for Deferred<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if !self.yielded {
            self.yielded = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        match self.value.take() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

/// Loader serving programs from a registry, suspending once per load and
/// recording the order in which names were requested.
#[derive(Default)]
pub struct RecordingLoader {
    programs: Imports,
    requests: Rc<RefCell<Vec<String>>>,
}

impl RecordingLoader {
    pub fn new(programs: Imports) -> Self {
        Self {
            programs,
            requests: Rc::default(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, program: impl Into<Rc<Program>>) -> Self {
        self.programs.insert(name, program);
        self
    }

    /// Names requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ComponentLoader for RecordingLoader {
    fn load(&self, name: &str) -> LoadFuture {
        self.requests.borrow_mut().push(name.to_owned());
        let result = self
            .programs
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::new(name, "no such component"));
        LocalFutureObj::new(Box::pin(Deferred {
            value: Some(result),
            yielded: false,
        }))
    }
}
