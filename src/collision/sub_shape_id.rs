/// Path to a leaf shape inside a shape hierarchy, packed into 32 bits.
///
/// Unused high bits are all set, so an empty path is `u32::MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubShapeId(u32);

impl SubShapeId {
    pub const MAX_BITS: u32 = 32;
    pub const EMPTY: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_value(value: u32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == u32::MAX
    }

    /// Pops `bits` bits off the front of the path, returning the popped value and the remainder.
    pub const fn pop_id(self, bits: u32) -> (u32, Self) {
        if bits == 0 {
            return (0, self);
        }

        let mask = if bits >= 32 { u32::MAX } else { (1 << bits) - 1 };
        let fill = if bits >= 32 { u32::MAX } else { u32::MAX << (32 - bits) };
        let remainder = if bits >= 32 { 0 } else { self.0 >> bits };

        (self.0 & mask, Self(remainder | fill))
    }
}

impl Default for SubShapeId {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Accumulates a [`SubShapeId`] while descending a shape hierarchy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubShapeIdCreator {
    id: SubShapeId,
    current_bit: u32,
}

impl SubShapeIdCreator {
    /// Appends `bits` bits holding `value` to the path.
    #[must_use]
    pub fn push_id(&self, value: u32, bits: u32) -> Self {
        debug_assert!(bits == 0 || value < (1u64 << bits) as u32 || bits == 32);
        debug_assert!(self.current_bit + bits <= SubShapeId::MAX_BITS);

        if bits == 0 {
            return *self;
        }

        let mask = if bits >= 32 { u32::MAX } else { (1 << bits) - 1 };
        let cleared = self.id.value() & !(mask << self.current_bit);

        Self {
            id: SubShapeId(cleared | ((value & mask) << self.current_bit)),
            current_bit: self.current_bit + bits,
        }
    }

    #[inline]
    pub const fn id(&self) -> SubShapeId {
        self.id
    }

    #[inline]
    pub const fn num_bits_written(&self) -> u32 {
        self.current_bit
    }
}
