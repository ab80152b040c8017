//! Native interop with the game's actor VFX routines
//!
//! ```text
//!   ModuleImage (.text) ──► NativeFunctionLocator ──► VfxAddresses
//!                                                         │
//!                                      VfxHooks::install ◄┘
//!                                              │
//!                           HookManager { spawn, remove, teardown }
//! ```
//!
//! Nothing outside this module sees raw addresses or the native calling
//! convention; callers work with [`NativeObject`](crate::world::NativeObject)
//! and [`EffectHandle`] only.

mod error;
mod hooks;
mod image;
mod locator;
mod signature;
mod vfx_struct;

#[cfg(target_os = "windows")]
mod detour;

pub use error::{HookError, LocateError};
pub use hooks::{CreateCall, EffectHandle, HookManager, OPEN_ENDED_DURATION, VfxHooks};
pub use image::ModuleImage;
pub use locator::{
    ACTOR_VFX_CREATE_SIG, ACTOR_VFX_REMOVE_SIG, NativeFunctionLocator, REMOVE_DISPLACEMENT_OFFSET,
    VfxAddresses,
};
pub use signature::Signature;
pub use vfx_struct::{Quat, Vec3, VfxStruct};

#[cfg(target_os = "windows")]
pub use detour::DetourHooks;

#[cfg(test)]
pub(crate) use hooks::tests::{FakeHooks, HookLog, active_manager};

impl<H: VfxHooks> HookManager<H> {
    /// Locate both routines in `image` and hook them.
    ///
    /// Any failure is logged once and yields a disabled manager.
    pub fn start(image: &ModuleImage<'_>) -> Self {
        let addresses = NativeFunctionLocator::new(image).resolve();
        if let Ok(found) = &addresses {
            tracing::info!(
                create = found.create,
                remove = found.remove,
                "Resolved actor VFX routines"
            );
        }
        Self::initialize(addresses.map_err(HookError::from))
    }
}
