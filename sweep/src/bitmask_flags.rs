use num_traits::{One, PrimInt};

/// Trait implemented by flag enums declared with [`define_bitmask_flags!`].
///
/// The enum's discriminant (via `#[repr(u8)]`) is the bit index, and `Storage`
/// picks the backing integer.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container used for wall flags, query flags and sweep diagnostics.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn empty() -> Self {
        Self { bits: T::zero() }
    }

    /// Build a mask with every tag in `tags` set.
    pub fn from_tags<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let bits = tags.iter().fold(T::zero(), |acc, t| acc | t.mask());
        Self { bits }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    /// Builder-style [`add`](Self::add).
    pub fn with<U: FlagBitmask<Storage = T>>(mut self, tag: U) -> Self {
        self.add(tag);
        self
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    /// Set every bit set in `other`.
    pub fn merge(&mut self, other: Self) {
        self.bits = self.bits | other.bits;
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// sweep::define_bitmask_flags!(DoorHint, u8, {
///     Sticky,
///     Noisy,
/// });
///
/// let flags = sweep::bitmask_flags::BitmaskFlags::<u8>::from_tags(&[DoorHint::Noisy]);
/// assert!(flags.has(DoorHint::Noisy));
/// assert!(!flags.has(DoorHint::Sticky));
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($(#[$meta:meta])* $variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$meta])* $variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}
