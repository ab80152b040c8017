//! Fixed-layout view of a native VFX instance
//!
//! Mirrors the game's layout for one build. Only [`VfxStruct::probe`] is used
//! today; nothing reads the fields.

use std::mem::{align_of, offset_of, size_of};
use std::ptr::NonNull;

use super::EffectHandle;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Rotation as stored by the game (note the X, Z, Y, W order).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quat {
    pub x: f32,
    pub z: f32,
    pub y: f32,
    pub w: f32,
}

#[repr(C)]
#[derive(Debug)]
pub struct VfxStruct {
    _pad0: [u8; 0x38],
    pub flags: u8,
    _pad1: [u8; 0x17],
    pub position: Vec3,
    _pad2: [u8; 0x04],
    pub rotation: Quat,
    pub scale: Vec3,
    _pad3: [u8; 0xAC],
    pub actor_caster: i32,
    _pad4: [u8; 0x04],
    pub actor_target: i32,
    _pad5: [u8; 0x84],
    pub static_caster: i32,
    _pad6: [u8; 0x04],
    pub static_target: i32,
    _pad7: [u8; 0x04],
}

const _: () = {
    assert!(offset_of!(VfxStruct, flags) == 0x38);
    assert!(offset_of!(VfxStruct, position) == 0x50);
    assert!(offset_of!(VfxStruct, rotation) == 0x60);
    assert!(offset_of!(VfxStruct, scale) == 0x70);
    assert!(offset_of!(VfxStruct, actor_caster) == 0x128);
    assert!(offset_of!(VfxStruct, actor_target) == 0x130);
    assert!(offset_of!(VfxStruct, static_caster) == 0x1B8);
    assert!(offset_of!(VfxStruct, static_target) == 0x1C0);
    assert!(size_of::<VfxStruct>() == 0x1C8);
};

impl VfxStruct {
    /// Typed pointer for `handle` if it could address a `VfxStruct`.
    ///
    /// Checks null and alignment only; never reads through the pointer.
    pub fn probe(handle: EffectHandle) -> Option<NonNull<VfxStruct>> {
        let addr = handle.addr();
        if addr % align_of::<VfxStruct>() != 0 {
            return None;
        }
        NonNull::new(addr as *mut VfxStruct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_accepts_aligned_handles() {
        let handle = EffectHandle::from_raw(0x7FF6_1234_5670).unwrap();
        assert_eq!(
            VfxStruct::probe(handle).map(|p| p.as_ptr() as usize),
            Some(0x7FF6_1234_5670)
        );
    }

    #[test]
    fn probe_rejects_misaligned_handles() {
        let handle = EffectHandle::from_raw(0x7FF6_1234_5671).unwrap();
        assert!(VfxStruct::probe(handle).is_none());
    }
}
