// src/common/response/parse.rs

use super::data::{FieldGroup, FieldValue, Measurement};
use super::error::{GroupFault, InvalidGroup};
use super::layout::{FrameLayout, GroupLayout, FIELD_SIZE};

use crate::common::error::DecodeError;
use crate::common::frame::{RawFrame, WORD_DATA_SIZE};
use crate::common::ieee754;

use chrono::{DateTime, Local};

/// Result of decoding one measurement response, group by group.
///
/// Groups are independent: a corrupted word in one group leaves the others
/// decoded. Only [`DecodedFrame::into_measurement`] enforces that *all* groups
/// must be valid before anything is handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    groups: Vec<Result<FieldGroup, InvalidGroup>>,
}

impl DecodedFrame {
    /// Every group in layout order, valid or not.
    pub fn groups(&self) -> &[Result<FieldGroup, InvalidGroup>] {
        &self.groups
    }

    /// The named group, if it decoded cleanly.
    pub fn group(&self, name: &str) -> Option<&FieldGroup> {
        self.groups
            .iter()
            .filter_map(|g| g.as_ref().ok())
            .find(|g| g.name == name)
    }

    pub fn invalid_groups(&self) -> impl Iterator<Item = &InvalidGroup> {
        self.groups.iter().filter_map(|g| g.as_ref().err())
    }

    /// True when every group passed validation.
    pub fn is_valid(&self) -> bool {
        self.groups.iter().all(Result::is_ok)
    }

    /// Builds the consumer-facing record, or `None` if any group is invalid.
    pub fn into_measurement(self, timestamp: DateTime<Local>) -> Option<Measurement> {
        let groups = self.groups.into_iter().collect::<Result<Vec<_>, _>>().ok()?;
        Some(Measurement { timestamp, groups })
    }
}

/// Decodes a measurement response according to `layout`.
///
/// # Arguments
///
/// * `layout`: The response layout of the sensor family.
/// * `bytes`: The raw response, CRC bytes included.
///
/// # Returns
///
/// * `Ok(DecodedFrame)` with per-group results.
/// * `Err(DecodeError::Length)` if the response length does not match the layout.
pub fn decode_frame(layout: &FrameLayout, bytes: &[u8]) -> Result<DecodedFrame, DecodeError> {
    let expected = layout.frame_len();
    if bytes.len() != expected {
        return Err(DecodeError::Length { expected, got: bytes.len() });
    }
    let frame = RawFrame::new(bytes)?;

    let mut groups = Vec::with_capacity(layout.groups.len());
    for (group, range) in layout.segments() {
        groups.push(decode_group(group, frame.slice(range)?));
    }
    Ok(DecodedFrame { groups })
}

/// Decodes one group, giving up on the first bad word.
fn decode_group(layout: &'static GroupLayout, segment: RawFrame<'_>) -> Result<FieldGroup, InvalidGroup> {
    let fail = |fault: GroupFault| InvalidGroup::new(layout.name, fault);

    let mut values = Vec::with_capacity(layout.fields.len());
    for (index, &name) in layout.fields.iter().enumerate() {
        let start = index * FIELD_SIZE;
        let field = segment
            .slice(start..start + FIELD_SIZE)
            .map_err(|e| InvalidGroup::new(layout.name, e))?;

        let mut raw = [0u8; 4];
        for (chunk, word) in raw.chunks_exact_mut(WORD_DATA_SIZE).zip(field.words()) {
            chunk.copy_from_slice(&word.map_err(|e| fail(e.into()))?);
        }

        let value = ieee754::decode_bytes(raw).map_err(|e| fail(e.into()))?;
        values.push(FieldValue { name, value });
    }

    Ok(FieldGroup { name: layout.name, unit: layout.unit, values })
}
