//! In-process detours on the actor VFX routines (Windows)
//!
//! Each detour forwards straight to the original, so the game behaves as if
//! unhooked. The trampolines are what [`DetourHooks`] calls to create and
//! remove effects on demand.

use std::ffi::{c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use retour::RawDetour;

use super::{CreateCall, EffectHandle, HookError, VfxAddresses, VfxHooks};

type ActorVfxCreateFn = unsafe extern "C" fn(
    path: *const c_char,
    caster: *mut c_void,
    target: *mut c_void,
    duration: f32,
    a5: u8,
    a6: u16,
    a7: u8,
) -> *mut c_void;

type ActorVfxRemoveFn = unsafe extern "C" fn(vfx: *mut c_void, a2: u8) -> *mut c_void;

/// Trampoline addresses read by the detours; 0 while unhooked.
static CREATE_ORIGINAL: AtomicUsize = AtomicUsize::new(0);
static REMOVE_ORIGINAL: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn actor_vfx_create_detour(
    path: *const c_char,
    caster: *mut c_void,
    target: *mut c_void,
    duration: f32,
    a5: u8,
    a6: u16,
    a7: u8,
) -> *mut c_void {
    let original = CREATE_ORIGINAL.load(Ordering::Acquire);
    if original == 0 {
        return ptr::null_mut();
    }
    // SAFETY: set from the trampoline of a detour on a routine with this signature
    let original: ActorVfxCreateFn = unsafe { std::mem::transmute(original) };
    unsafe { original(path, caster, target, duration, a5, a6, a7) }
}

unsafe extern "C" fn actor_vfx_remove_detour(vfx: *mut c_void, a2: u8) -> *mut c_void {
    let original = REMOVE_ORIGINAL.load(Ordering::Acquire);
    if original == 0 {
        return ptr::null_mut();
    }
    // SAFETY: as above
    let original: ActorVfxRemoveFn = unsafe { std::mem::transmute(original) };
    unsafe { original(vfx, a2) }
}

pub struct DetourHooks {
    create: RawDetour,
    remove: RawDetour,
    create_original: ActorVfxCreateFn,
    remove_original: ActorVfxRemoveFn,
}

/// Build a detour and publish its trampoline; the detour is not yet enabled.
///
/// # Safety
/// `target` must be the entry of a routine whose signature matches `detour`.
unsafe fn prepare(
    target: usize,
    detour: *const (),
    original: &AtomicUsize,
    routine: &'static str,
) -> Result<RawDetour, HookError> {
    let hook = unsafe { RawDetour::new(target as *const (), detour) }.map_err(|err| {
        HookError::Install {
            routine,
            reason: err.to_string(),
        }
    })?;
    original.store(hook.trampoline() as *const () as usize, Ordering::Release);
    Ok(hook)
}

fn enable(hook: &RawDetour, routine: &'static str) -> Result<(), HookError> {
    unsafe { hook.enable() }.map_err(|err| HookError::Install {
        routine,
        reason: err.to_string(),
    })
}

fn disable(hook: &RawDetour, original: &AtomicUsize, routine: &'static str) {
    if let Err(err) = unsafe { hook.disable() } {
        tracing::warn!(routine, error = %err, "Failed to disable hook");
    }
    original.store(0, Ordering::Release);
}

impl VfxHooks for DetourHooks {
    fn install(addresses: VfxAddresses) -> Result<Self, HookError> {
        // SAFETY: addresses come from the signature scan of this game build
        let create = unsafe {
            prepare(
                addresses.create,
                actor_vfx_create_detour as *const (),
                &CREATE_ORIGINAL,
                "ActorVfxCreate",
            )
        }?;
        let remove = match unsafe {
            prepare(
                addresses.remove,
                actor_vfx_remove_detour as *const (),
                &REMOVE_ORIGINAL,
                "ActorVfxRemove",
            )
        } {
            Ok(remove) => remove,
            Err(err) => {
                CREATE_ORIGINAL.store(0, Ordering::Release);
                return Err(err);
            }
        };

        if let Err(err) = enable(&create, "ActorVfxCreate") {
            CREATE_ORIGINAL.store(0, Ordering::Release);
            REMOVE_ORIGINAL.store(0, Ordering::Release);
            return Err(err);
        }
        if let Err(err) = enable(&remove, "ActorVfxRemove") {
            disable(&create, &CREATE_ORIGINAL, "ActorVfxCreate");
            REMOVE_ORIGINAL.store(0, Ordering::Release);
            return Err(err);
        }

        tracing::debug!(
            create = addresses.create,
            remove = addresses.remove,
            "Actor VFX detours enabled"
        );

        // SAFETY: trampolines have the original routines' signatures
        let (create_original, remove_original) = unsafe {
            (
                std::mem::transmute::<&(), ActorVfxCreateFn>(create.trampoline()),
                std::mem::transmute::<&(), ActorVfxRemoveFn>(remove.trampoline()),
            )
        };

        Ok(Self {
            create,
            remove,
            create_original,
            remove_original,
        })
    }

    fn create(&mut self, call: &CreateCall<'_>) -> usize {
        // SAFETY: arguments follow the native calling convention; the path
        // outlives the call and the objects are live this frame
        let vfx = unsafe {
            (self.create_original)(
                call.path.as_ptr(),
                call.caster.addr() as *mut c_void,
                call.target.addr() as *mut c_void,
                call.duration,
                call.a5,
                call.a6,
                call.a7,
            )
        };
        vfx as usize
    }

    fn remove(&mut self, handle: EffectHandle, flag: u8) {
        // SAFETY: handle was returned by the create routine and not yet removed
        unsafe { (self.remove_original)(handle.addr() as *mut c_void, flag) };
    }

    fn release(self) {
        disable(&self.create, &CREATE_ORIGINAL, "ActorVfxCreate");
        disable(&self.remove, &REMOVE_ORIGINAL, "ActorVfxRemove");
    }
}
