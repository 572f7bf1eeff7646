// src/common/response/mod.rs

mod data;
mod error;
pub mod layout;
mod metadata;
pub mod parse;

pub use data::{FieldGroup, FieldValue, Measurement};
pub use error::{GroupFault, InvalidGroup};
pub use layout::{FrameLayout, GroupLayout, FIELD_SIZE};
pub use metadata::{ascii_string, be_u16, be_u32, FirmwareVersion, ProductType, StatusRegister};
pub use parse::{decode_frame, DecodedFrame};
