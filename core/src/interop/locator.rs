//! Native routine discovery
//!
//! Finds the game's actor VFX create/remove routines by scanning `.text` for
//! fixed instruction sequences. Both signatures and the displacement offset
//! are tied to one game build: a patch that moves them makes [`resolve`]
//! fail rather than hand back a wrong address.
//!
//! [`resolve`]: NativeFunctionLocator::resolve

use super::{LocateError, ModuleImage, Signature};

/// Prologue of the actor VFX create routine.
pub const ACTOR_VFX_CREATE_SIG: &str = "40 53 55 56 57 48 81 EC ?? ?? ?? ?? 0F 29 B4 24 ?? ?? ?? ?? 48 8B 05 ?? ?? ?? ?? 48 33 C4 48 89 84 24 ?? ?? ?? ?? 0F B6 AC 24 ?? ?? ?? ?? 0F 28 F3 49 8B F8";

/// `movups [rax+10h], xmm1; lea rax, [rip+disp32]` loading the VFX vtable,
/// whose first slot is the remove routine.
pub const ACTOR_VFX_REMOVE_SIG: &str = "0F 11 48 10 48 8D 05";

/// Offset of the `lea` disp32 from the start of the remove signature match.
pub const REMOVE_DISPLACEMENT_OFFSET: usize = 7;

/// Entry points of the two native routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfxAddresses {
    pub create: usize,
    pub remove: usize,
}

pub struct NativeFunctionLocator<'i, 'a> {
    image: &'i ModuleImage<'a>,
}

impl<'i, 'a> NativeFunctionLocator<'i, 'a> {
    pub fn new(image: &'i ModuleImage<'a>) -> Self {
        Self { image }
    }

    /// Resolve both routines. Either both resolve or this fails.
    pub fn resolve(&self) -> Result<VfxAddresses, LocateError> {
        let create = self.scan(ACTOR_VFX_CREATE_SIG, "ActorVfxCreate")?;

        let matched = self.scan(ACTOR_VFX_REMOVE_SIG, "ActorVfxRemove")?;
        let slot = self.follow_rip_relative(matched + REMOVE_DISPLACEMENT_OFFSET)?;
        let remove = self.image.read_ptr(slot)?;
        if remove == 0 {
            return Err(LocateError::NullTarget {
                routine: "ActorVfxRemove",
            });
        }

        Ok(VfxAddresses { create, remove })
    }

    /// Absolute address of the first match of `signature` in `.text`.
    fn scan(&self, signature: &str, routine: &'static str) -> Result<usize, LocateError> {
        let signature = Signature::parse(signature)?;
        signature
            .find(self.image.text())
            .map(|offset| self.image.text_base() + offset)
            .ok_or(LocateError::SignatureNotFound { routine })
    }

    /// Target of a disp32 operand located at `operand`: the displacement is
    /// relative to the end of the operand.
    fn follow_rip_relative(&self, operand: usize) -> Result<usize, LocateError> {
        let displacement = self.image.read_i32(operand)? as isize;
        (operand + 4)
            .checked_add_signed(displacement)
            .ok_or(LocateError::OutOfBounds {
                address: operand,
                len: 4,
            })
    }
}
