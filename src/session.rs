//! Process-wide model session with scoped acquisition
//!
//! The segmentation model is expensive to load, so it is loaded at most once
//! per process and reused across removal runs. Access goes through
//! [`ModelSession::acquire`], which returns a [`SessionGuard`] holding the
//! session lock for the duration of one run. There is no way to reach the
//! backend without going through a guard.
//!
//! A failed load does not poison the session: the slot is cleared and the
//! next acquisition retries from scratch.

use crate::{
    config::RemovalConfig,
    error::{RemovalError, Result},
    inference::InferenceBackend,
};
use instant::Duration;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::{debug, info, warn};

/// Creates inference backends for the session
///
/// The session owns one factory and invokes it lazily on first acquisition
/// (and again after a failed load).
pub trait BackendFactory: Send {
    /// Create a fresh, uninitialized backend
    ///
    /// # Errors
    /// Returns an error when no backend is available in this build.
    fn create_backend(&self) -> Result<Box<dyn InferenceBackend>>;
}

/// Factory for the backend compiled into this build
#[derive(Debug, Default)]
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    #[cfg(feature = "tract")]
    fn create_backend(&self) -> Result<Box<dyn InferenceBackend>> {
        Ok(Box::new(crate::backends::TractBackend::new()))
    }

    #[cfg(not(feature = "tract"))]
    fn create_backend(&self) -> Result<Box<dyn InferenceBackend>> {
        Err(RemovalError::model(
            "No inference backend compiled into this build (enable the `tract` feature)",
        ))
    }
}

struct SessionInner {
    backend: Option<Box<dyn InferenceBackend>>,
    factory: Box<dyn BackendFactory>,
    model_load: Option<Duration>,
}

/// Cached model session
///
/// Holds the loaded backend behind a mutex. [`ModelSession::global`] exposes
/// the process-wide instance; separate instances are used in tests.
pub struct ModelSession {
    inner: Mutex<SessionInner>,
}

impl ModelSession {
    /// Create an empty session using the default backend factory
    #[must_use]
    pub fn new() -> Self {
        Self::with_factory(Box::new(DefaultBackendFactory))
    }

    /// Create an empty session using a custom backend factory
    #[must_use]
    pub fn with_factory(factory: Box<dyn BackendFactory>) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                backend: None,
                factory,
                model_load: None,
            }),
        }
    }

    /// Create a session seeded with an already-constructed backend
    ///
    /// The backend is initialized on first acquisition like any other.
    #[must_use]
    pub fn with_backend(backend: Box<dyn InferenceBackend>) -> Self {
        let session = Self::new();
        if let Ok(mut inner) = session.inner.lock() {
            inner.backend = Some(backend);
        }
        session
    }

    /// The process-wide session
    pub fn global() -> Arc<ModelSession> {
        static SESSION: OnceLock<Arc<ModelSession>> = OnceLock::new();
        Arc::clone(SESSION.get_or_init(|| Arc::new(ModelSession::new())))
    }

    /// Acquire the session for one removal run, loading the model if needed
    ///
    /// Blocks while another run holds the session. The returned guard keeps
    /// the lock until dropped.
    ///
    /// # Errors
    /// - Backend construction failures
    /// - Model loading failures (the slot is cleared so a later call retries)
    pub fn acquire(&self, config: &RemovalConfig) -> Result<SessionGuard<'_>> {
        let mut inner = self.lock()?;

        if inner.backend.is_none() {
            debug!("creating inference backend");
            let backend = inner.factory.create_backend()?;
            inner.backend = Some(backend);
        }

        let mut load_time = None;
        let needs_load = inner
            .backend
            .as_ref()
            .is_some_and(|backend| !backend.is_initialized());
        if needs_load {
            let load_result = inner
                .backend
                .as_mut()
                .map(|backend| backend.initialize(config));
            match load_result {
                Some(Ok(elapsed)) => {
                    load_time = elapsed;
                    inner.model_load = elapsed;
                    if let Some(elapsed) = elapsed {
                        info!(
                            elapsed_ms = elapsed.as_millis() as u64,
                            "model session ready"
                        );
                    }
                },
                Some(Err(e)) => {
                    warn!(error = %e, "model load failed, clearing session slot");
                    inner.backend = None;
                    inner.model_load = None;
                    return Err(e);
                },
                None => {
                    return Err(RemovalError::internal("model session lost its backend"));
                },
            }
        }

        Ok(SessionGuard { inner, load_time })
    }

    /// Whether the model is currently loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.lock().is_ok_and(|inner| {
            inner
                .backend
                .as_ref()
                .is_some_and(|backend| backend.is_initialized())
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionInner>> {
        self.inner
            .lock()
            .map_err(|_| RemovalError::internal("model session mutex poisoned"))
    }
}

impl Default for ModelSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive scoped access to the loaded model
///
/// Holds the session lock; drop it promptly after the forward pass.
pub struct SessionGuard<'a> {
    inner: MutexGuard<'a, SessionInner>,
    load_time: Option<Duration>,
}

impl SessionGuard<'_> {
    /// Run a forward pass on the loaded model
    ///
    /// # Errors
    /// Propagates backend inference failures.
    pub fn infer(&mut self, input: &ndarray::Array4<f32>) -> Result<ndarray::Array4<f32>> {
        match self.inner.backend.as_deref_mut() {
            Some(backend) => backend.infer(input),
            None => Err(RemovalError::internal("model session guard without backend")),
        }
    }

    /// Time spent loading the model during this acquisition, if a load
    /// happened
    #[must_use]
    pub fn model_load_time(&self) -> Option<Duration> {
        self.load_time
    }
}
