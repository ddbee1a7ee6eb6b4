use gloo_timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::Rc;

/// Trailing-edge debounce: each call replaces the pending one, so only the
/// last call in a burst runs, `delay_ms` after it was made.
#[derive(Clone)]
pub struct Debouncer {
    delay_ms: u32,
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl Debouncer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        // Dropping the previous handle clears its timer
        *self.pending.borrow_mut() = Some(Timeout::new(self.delay_ms, f));
    }

    pub fn cancel(&self) {
        self.pending.borrow_mut().take();
    }
}
