mod sealed {
    pub trait Sealed {}
}

/// Primitive integer types `parse_int` can produce. `bool` is deliberately
/// not one of them.
pub trait Integer: sealed::Sealed + Copy + PartialEq + std::fmt::Debug {
    const SIGNED: bool;
    const ZERO: Self;

    /// `value` is at most 36, which fits every implementor.
    fn from_u8(value: u8) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_neg(self) -> Self;
}

macro_rules! impl_integer {
    ($signed:expr => $($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl Integer for $t {
            const SIGNED: bool = $signed;
            const ZERO: Self = 0;

            #[inline]
            fn from_u8(value: u8) -> Self {
                value as $t
            }

            #[inline]
            fn wrapping_mul(self, rhs: Self) -> Self {
                <$t>::wrapping_mul(self, rhs)
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_neg(self) -> Self {
                <$t>::wrapping_neg(self)
            }
        }
    )*};
}

impl_integer!(true => i8, i16, i32, i64, i128, isize);
impl_integer!(false => u8, u16, u32, u64, u128, usize);
