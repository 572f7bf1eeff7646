// src/common/response/layout.rs

use core::ops::Range;

use crate::common::frame::WORD_SIZE;

/// Bytes per float field on the wire: two words of `[data, data, crc]`.
pub const FIELD_SIZE: usize = 2 * WORD_SIZE;

/// A named cluster of float fields sharing one unit, e.g. the four PM mass densities.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GroupLayout {
    pub name: &'static str,
    pub unit: &'static str,
    /// Field names in wire order.
    pub fields: &'static [&'static str],
}

impl GroupLayout {
    pub const fn new(name: &'static str, unit: &'static str, fields: &'static [&'static str]) -> Self {
        GroupLayout { name, unit, fields }
    }

    /// Bytes this group occupies in the measurement response.
    #[inline]
    pub const fn byte_len(&self) -> usize {
        self.fields.len() * FIELD_SIZE
    }
}

/// Fixed layout of a measurement response: groups laid out back to back.
///
/// Group offsets are never written down by hand; each group starts where the
/// previous one ends.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameLayout {
    pub groups: &'static [GroupLayout],
}

impl FrameLayout {
    pub const fn new(groups: &'static [GroupLayout]) -> Self {
        FrameLayout { groups }
    }

    /// Total response length in bytes, CRC bytes included.
    pub const fn frame_len(&self) -> usize {
        let mut len = 0;
        let mut i = 0;
        while i < self.groups.len() {
            len += self.groups[i].byte_len();
            i += 1;
        }
        len
    }

    /// Each group with the byte range it occupies in the response.
    pub fn segments(&self) -> impl Iterator<Item = (&'static GroupLayout, Range<usize>)> {
        let groups: &'static [GroupLayout] = self.groups;
        groups.iter().scan(0usize, |offset, group| {
            let start = *offset;
            *offset += group.byte_len();
            Some((group, start..*offset))
        })
    }

    pub fn group(&self, name: &str) -> Option<&'static GroupLayout> {
        let groups: &'static [GroupLayout] = self.groups;
        groups.iter().find(|group| group.name == name)
    }
}
