//! Exclusive access to the rendering backend.
//!
//! The backend holds context-wide mutable state (the active render target,
//! draw colour, the presentation surface). Every operation that touches it,
//! whether clearing, presenting, creating textures, uploading pixels or
//! copying between targets, goes through one [`GpuContext`] lock. The renderer
//! and every surface created from it share the same `GpuContext`, so these
//! operations are serialised no matter which thread issues them.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::RenderError;
use crate::render::backend::{BackendError, RenderBackend, RenderTarget};

#[derive(Clone)]
pub struct GpuContext {
    backend: Arc<Mutex<Box<dyn RenderBackend>>>,
}

impl GpuContext {
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
        }
    }

    /// Acquires the context. The lock is released when the guard drops,
    /// including on early returns through `?`.
    pub fn lock(&self) -> Result<ContextGuard<'_>, RenderError> {
        let guard = self.backend.lock().map_err(|_| RenderError::ContextPoisoned)?;
        Ok(ContextGuard { backend: guard })
    }

    /// Whether both handles refer to the same backend.
    pub fn same_as(&self, other: &GpuContext) -> bool {
        Arc::ptr_eq(&self.backend, &other.backend)
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("handles", &Arc::strong_count(&self.backend))
            .finish()
    }
}

/// Scoped access to the backend.
pub struct ContextGuard<'a> {
    backend: MutexGuard<'a, Box<dyn RenderBackend>>,
}

impl ContextGuard<'_> {
    /// Runs `f` with `target` as the active render target and switches back to
    /// the window before returning, whether or not `f` succeeded.
    pub fn redirect<R>(
        &mut self,
        target: RenderTarget,
        f: impl FnOnce(&mut dyn RenderBackend) -> Result<R, BackendError>,
    ) -> Result<R, RenderError> {
        if target == RenderTarget::Window {
            return Ok(f(self.backend.as_mut())?);
        }

        self.backend.set_render_target(target)?;
        let result = f(self.backend.as_mut());
        let restored = self.backend.set_render_target(RenderTarget::Window);

        let value = result?;
        restored?;
        Ok(value)
    }

    /// Downcasts the backend, mostly useful for tests and tooling.
    pub fn downcast_ref<T: RenderBackend>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: RenderBackend>(&mut self) -> Option<&mut T> {
        self.backend.as_any_mut().downcast_mut::<T>()
    }
}

impl Deref for ContextGuard<'_> {
    type Target = dyn RenderBackend;

    fn deref(&self) -> &Self::Target {
        self.backend.as_ref()
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.backend.as_mut()
    }
}
