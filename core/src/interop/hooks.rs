//! Hook layer over the native VFX routines
//!
//! [`HookManager`] is the only way the rest of the crate reaches native
//! code. It hands out opaque [`EffectHandle`]s, remembers every one it has
//! created, and frees them all on [`teardown`](HookManager::teardown) before
//! the hooks themselves are released.
//!
//! The native calls go through a [`VfxHooks`] backend: `DetourHooks`
//! in-process on Windows, a recording fake in tests.

use std::ffi::{CStr, CString};
use std::fmt;
use std::num::NonZeroUsize;

use hashbrown::HashSet;

use super::{HookError, VfxAddresses};
use crate::world::NativeObject;

/// Duration sentinel for "play until removed".
pub const OPEN_ENDED_DURATION: f32 = -1.0;

/// A spawned native VFX instance. Never null.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectHandle(NonZeroUsize);

impl EffectHandle {
    /// `None` for the null pointer the game returns on failure.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn addr(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectHandle({:#X})", self.addr())
    }
}

/// Arguments of the native create routine, in call order.
#[derive(Debug, Clone, Copy)]
pub struct CreateCall<'a> {
    pub path: &'a CStr,
    pub caster: NativeObject,
    pub target: NativeObject,
    pub duration: f32,
    pub a5: u8,
    pub a6: u16,
    pub a7: u8,
}

/// Installed interception of the two native routines.
pub trait VfxHooks: Sized {
    /// Hook both routines. All-or-nothing: on error nothing stays hooked.
    fn install(addresses: VfxAddresses) -> Result<Self, HookError>;

    /// Call the original create routine. Returns the raw result, `0` on failure.
    fn create(&mut self, call: &CreateCall<'_>) -> usize;

    /// Call the original remove routine.
    fn remove(&mut self, handle: EffectHandle, flag: u8);

    /// Unhook both routines.
    fn release(self);
}

/// Owns the hook backend and every handle created through it.
pub struct HookManager<H: VfxHooks> {
    /// `None` when startup failed or after teardown; every call is then a no-op
    hooks: Option<H>,
    handles: HashSet<EffectHandle>,
}

impl<H: VfxHooks> HookManager<H> {
    /// A manager whose hooks never came up.
    pub fn disabled() -> Self {
        Self {
            hooks: None,
            handles: HashSet::new(),
        }
    }

    pub fn from_hooks(hooks: H) -> Self {
        Self {
            hooks: Some(hooks),
            handles: HashSet::new(),
        }
    }

    /// Install hooks at already-resolved addresses.
    ///
    /// Failure is logged once and leaves a disabled manager.
    pub fn initialize(addresses: Result<VfxAddresses, HookError>) -> Self {
        match addresses.and_then(H::install) {
            Ok(hooks) => {
                tracing::info!("VFX hooks installed");
                Self::from_hooks(hooks)
            }
            Err(err) => {
                tracing::error!(error = %err, "VFX hooks unavailable, effects disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.hooks.is_some()
    }

    /// Number of handles created and not yet removed.
    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    pub fn owns(&self, handle: EffectHandle) -> bool {
        self.handles.contains(&handle)
    }

    /// Spawn `path` on `target`. `None` if hooks are down or the game
    /// returned null.
    pub fn spawn(&mut self, path: &str, target: NativeObject) -> Option<EffectHandle> {
        let hooks = self.hooks.as_mut()?;
        let Ok(path) = CString::new(path) else {
            tracing::warn!(path, "Effect path contains a NUL byte");
            return None;
        };

        let raw = hooks.create(&CreateCall {
            path: &path,
            caster: target,
            target,
            duration: OPEN_ENDED_DURATION,
            a5: 0,
            a6: 0,
            a7: 0,
        });

        let Some(handle) = EffectHandle::from_raw(raw) else {
            tracing::debug!(object = target.addr(), "Native create returned null");
            return None;
        };
        self.handles.insert(handle);
        Some(handle)
    }

    /// Remove a handle created by [`spawn`](Self::spawn). Unknown handles
    /// are ignored.
    pub fn remove(&mut self, handle: EffectHandle) {
        if !self.handles.remove(&handle) {
            return;
        }
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.remove(handle, 0);
            tracing::info!(handle = ?handle, "Removed VFX");
        }
    }

    /// Free every outstanding handle, then release the hooks.
    ///
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        let Some(mut hooks) = self.hooks.take() else {
            self.handles.clear();
            return;
        };

        let drained = self.handles.len();
        for handle in self.handles.drain() {
            hooks.remove(handle, 0);
        }
        hooks.release();

        tracing::info!(drained, "VFX hooks released");
    }

    #[cfg(test)]
    pub(crate) fn hooks(&self) -> Option<&H> {
        self.hooks.as_ref()
    }
}

impl<H: VfxHooks> Drop for HookManager<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<H: VfxHooks> fmt::Debug for HookManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookManager")
            .field("active", &self.is_active())
            .field("live_handles", &self.handles.len())
            .finish()
    }
}
