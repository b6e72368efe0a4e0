//! Alignment helpers

/// Section and payload alignment used throughout the archive
pub const ALIGNMENT: usize = 32;

/// Round `value` up to the next multiple of `alignment` (a power of two)
pub const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// Zero bytes needed to bring `value` up to `alignment`
pub const fn padding_for(value: usize, alignment: usize) -> usize {
    align_up(value, alignment) - value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 32), 0);
        assert_eq!(align_up(1, 32), 32);
        assert_eq!(align_up(32, 32), 32);
        assert_eq!(align_up(33, 32), 64);
        assert_eq!(align_up(0x44, 32), 0x60);
    }

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0, 32), 0);
        assert_eq!(padding_for(4, 32), 28);
        assert_eq!(padding_for(64, 32), 0);
    }
}
