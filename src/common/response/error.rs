// src/common/response/error.rs

use crate::common::error::{CrcMismatch, DecodeError};

/// Why a field group was dropped from a decoded frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum GroupFault {
    #[error(transparent)]
    Crc(#[from] CrcMismatch),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A field group that failed validation. It carries no values at all.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("field group '{name}' invalid: {fault}")]
pub struct InvalidGroup {
    pub name: &'static str,
    pub fault: GroupFault,
}

impl InvalidGroup {
    pub fn new(name: &'static str, fault: impl Into<GroupFault>) -> Self {
        InvalidGroup { name, fault: fault.into() }
    }
}
