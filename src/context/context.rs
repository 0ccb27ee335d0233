//! Rendering context management.
//!
//! The host installs a [`GraphicsBackend`] once its surface is ready; materials and
//! geometry then fetch it with [`Context::get`].

use super::GraphicsBackend;
use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

// The per-thread rendering context. GL contexts are bound to one thread, so the
// singleton is thread-local rather than global.
thread_local! {
    static CONTEXT_SINGLETON: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// The rendering context: a cheap, cloneable handle on the active backend.
#[derive(Clone)]
pub struct Context {
    backend: Rc<dyn GraphicsBackend>,
}

impl Context {
    /// Initializes or replaces the context of the current thread.
    pub fn init<B: GraphicsBackend + 'static>(backend: B) {
        Self::init_shared(Rc::new(backend))
    }

    /// Same as [`init`](Self::init) but lets the caller keep a handle on the backend.
    pub fn init_shared(backend: Rc<dyn GraphicsBackend>) {
        CONTEXT_SINGLETON.with(|cell| {
            *cell.borrow_mut() = Some(Context { backend });
        });
    }

    /// Gets a clone of the current context.
    ///
    /// # Panics
    /// Panics if the context has not been initialized via `init()`.
    pub fn get() -> Context {
        Self::try_get().expect("rendering context not initialized. Call Context::init() first.")
    }

    /// Gets a clone of the current context, if any.
    pub fn try_get() -> Option<Context> {
        CONTEXT_SINGLETON.with(|cell| cell.borrow().clone())
    }

    /// Checks if the context has been initialized.
    pub fn is_initialized() -> bool {
        CONTEXT_SINGLETON.with(|cell| cell.borrow().is_some())
    }

    /// Drops the context of the current thread.
    ///
    /// Objects created before the reset keep the backend alive until they are dropped.
    pub fn reset() {
        CONTEXT_SINGLETON.with(|cell| {
            *cell.borrow_mut() = None;
        });
    }
}

impl Deref for Context {
    type Target = dyn GraphicsBackend;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &*self.backend
    }
}
