//! Named copy implementations.
#![allow(unsafe_code)]

use log::debug;

use super::HarnessError;
use crate::engine::{copy, copy_with};
use crate::preload::NoPreload;

/// Any routine with the `copy` contract: copy `n` bytes, return `dest`,
/// do nothing for negative `n`.
pub type CopyFn = unsafe fn(dest: *mut u8, src: *const u8, n: isize) -> *mut u8;

#[derive(Debug, Clone, Copy)]
pub struct Variant {
    pub name: &'static str,
    pub func: CopyFn,
}

impl Variant {
    pub const fn new(name: &'static str, func: CopyFn) -> Self {
        Self { name, func }
    }
}

/// Byte-at-a-time copy used as the ground truth.
///
/// # Safety
///
/// - `dest` and `src` must be valid for writes/reads of `n` bytes
/// - The memory regions must not overlap
pub unsafe fn reference_copy(dest: *mut u8, src: *const u8, n: isize) -> *mut u8 {
    let mut i = 0;
    while i < n {
        core::ptr::write_volatile(dest.offset(i), *src.offset(i));
        i += 1;
    }
    dest
}

unsafe fn std_copy(dest: *mut u8, src: *const u8, n: isize) -> *mut u8 {
    if n > 0 {
        core::ptr::copy_nonoverlapping(src, dest, n as usize);
    }
    dest
}

/// Ordered set of variants, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    variants: Vec<Variant>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the engine (with and without preload), the
    /// byte-loop reference, and `core::ptr::copy_nonoverlapping`.
    pub fn with_builtin() -> Self {
        let variants = vec![
            Variant::new("fastarm", copy),
            Variant::new("fastarm-nopreload", copy_with::<NoPreload>),
            Variant::new("reference", reference_copy),
            Variant::new("std", std_copy),
        ];
        Self { variants }
    }

    pub fn register(&mut self, variant: Variant) -> Result<(), HarnessError> {
        if self.get(variant.name).is_some() {
            return Err(HarnessError::DuplicateVariant(variant.name.to_string()));
        }
        debug!("registered copy variant `{}`", variant.name);
        self.variants.push(variant);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Resolve `names` in the given order. An empty list selects every
    /// registered variant.
    pub fn select(&self, names: &[&str]) -> Result<Vec<Variant>, HarnessError> {
        if names.is_empty() {
            return Ok(self.variants.clone());
        }
        names
            .iter()
            .map(|&name| {
                self.get(name)
                    .copied()
                    .ok_or_else(|| HarnessError::UnknownVariant(name.to_string()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
