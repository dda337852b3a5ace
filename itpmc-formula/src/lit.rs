//! Timed literals and variables.
use std::{fmt, ops};

/// The backing type used to represent literals and variables.
pub type LitIdx = u32;

/// A timeframe index.
///
/// Timeframe 0 is the frame a clause set is written against; unrolling shifts
/// literals to higher frames. Negative frames appear transiently when an
/// interpolant extracted at frame 1 is shifted back to act as an initial
/// state predicate.
pub type Frame = i32;

/// A boolean state variable of a transition system.
///
/// Variables are identified by a 0-based index. The timeframe is not part of
/// the variable itself: the same variable replicated over timeframes is
/// expressed through the [`Lit`] type.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var {
    index: LitIdx,
}

impl Var {
    /// Creates a variable from a 0-based index.
    ///
    /// The index may not represent a variable past `Var::max_var()`.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        debug_assert!(index <= Var::max_var().index());
        Var {
            index: index as LitIdx,
        }
    }

    /// The 0-based index representing this variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// The variable with largest index that is supported.
    ///
    /// This is less than the backing integer type supports, leaving space for
    /// a sign or tag bit packed next to an index.
    pub const fn max_var() -> Var {
        Var {
            index: LitIdx::max_value() >> 4,
        }
    }

    /// Largest number of variables supported.
    ///
    /// This is exactly `Var::max_var().index() + 1`.
    pub const fn max_count() -> usize {
        Self::max_var().index() + 1
    }

    /// Creates a literal for this variable at timeframe 0.
    #[inline]
    pub fn lit(self, polarity: bool) -> Lit {
        Lit::from_var(self, polarity)
    }

    /// Creates a positive timeframe-0 literal for this variable.
    #[inline]
    pub fn positive(self) -> Lit {
        Lit::positive(self)
    }

    /// Creates a negative timeframe-0 literal for this variable.
    #[inline]
    pub fn negative(self) -> Lit {
        Lit::negative(self)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A timed boolean literal.
///
/// Conceptually a literal consists of a [`Var`], a `bool` indicating whether
/// the variable is negated, and a timeframe. Internally variable and polarity
/// are packed into a single code that is two times the variable index, plus
/// one for negated literals.
///
/// Negation flips the polarity and leaves the timeframe alone; `shift` adds
/// to the timeframe and leaves variable and polarity alone. Shifting by 0 is
/// the identity and shifts compose additively.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Lit {
    code: LitIdx,
    frame: Frame,
}

impl Lit {
    /// Creates a timeframe-0 literal from a `Var` and a `bool` that is `true`
    /// when the literal is positive.
    #[inline]
    pub fn from_var(var: Var, polarity: bool) -> Lit {
        Lit {
            code: (var.index << 1) | (!polarity as LitIdx),
            frame: 0,
        }
    }

    /// Create a positive timeframe-0 literal from a `Var`.
    #[inline]
    pub fn positive(var: Var) -> Lit {
        Lit::from_var(var, true)
    }

    /// Create a negative timeframe-0 literal from a `Var`.
    #[inline]
    pub fn negative(var: Var) -> Lit {
        Lit::from_var(var, false)
    }

    /// Create a timeframe-0 literal from a variable index and a `bool` that
    /// is `true` when the literal is positive.
    #[inline]
    pub fn from_index(index: usize, polarity: bool) -> Lit {
        Lit::from_var(Var::from_index(index), polarity)
    }

    /// Creates a timeframe-0 literal from a non-zero integer.
    ///
    /// The absolute value is used as 1-based index, the sign of the integer
    /// is used as sign of the literal.
    #[inline]
    pub fn from_dimacs(number: isize) -> Lit {
        debug_assert!(number != 0);
        Lit::from_index(number.abs() as usize - 1, number > 0)
    }

    /// 1-based integer representation of the literal, opposite of
    /// `from_dimacs`. The timeframe is not represented.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        let number = self.index() as isize + 1;
        if self.is_negative() {
            -number
        } else {
            number
        }
    }

    /// 0-based index of the literal's _variable_.
    #[inline]
    pub fn index(self) -> usize {
        (self.code >> 1) as usize
    }

    /// The literal's variable.
    #[inline]
    pub fn var(self) -> Var {
        Var {
            index: self.code >> 1,
        }
    }

    /// The literal's timeframe.
    #[inline]
    pub fn frame(self) -> Frame {
        self.frame
    }

    /// Whether the literal is negative, i.e. a negated variable.
    #[inline]
    pub fn is_negative(self) -> bool {
        (self.code & 1) != 0
    }

    /// Whether the literal is positive, i.e. a non-negated variable.
    #[inline]
    pub fn is_positive(self) -> bool {
        !self.is_negative()
    }

    /// Two times the variable's index for positive literals and one more for
    /// negative literals.
    #[inline]
    pub fn code(self) -> usize {
        self.code as usize
    }

    /// The same literal moved `amount` timeframes to the right.
    #[inline]
    pub fn shift(self, amount: Frame) -> Lit {
        Lit {
            code: self.code,
            frame: self.frame + amount,
        }
    }

    /// The same literal placed at the given timeframe.
    #[inline]
    pub fn at(self, frame: Frame) -> Lit {
        Lit {
            code: self.code,
            frame,
        }
    }

    /// The positive literal of the same variable and timeframe.
    #[inline]
    pub fn to_positive(self) -> Lit {
        Lit {
            code: self.code & !1,
            frame: self.frame,
        }
    }
}

impl ops::Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit {
            code: self.code ^ 1,
            frame: self.frame,
        }
    }
}

impl ops::BitXor<bool> for Lit {
    type Output = Lit;

    #[inline]
    fn bitxor(self, rhs: bool) -> Lit {
        Lit {
            code: self.code ^ (rhs as LitIdx),
            frame: self.frame,
        }
    }
}

impl From<Var> for Lit {
    #[inline]
    fn from(var: Var) -> Lit {
        Lit::positive(var)
    }
}

/// Prints as `var:frame` with a leading `-` for negated literals.
impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}:{}",
            if self.is_negative() { "-" } else { "" },
            self.index(),
            self.frame
        )
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::{prelude::*, *};

    pub fn var(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Var> {
        index.prop_map(Var::from_index)
    }

    pub fn lit(
        index: impl Strategy<Value = usize>,
        frame: impl Strategy<Value = Frame>,
    ) -> impl Strategy<Value = Lit> {
        (var(index), bool::ANY, frame)
            .prop_map(|(var, polarity, frame)| var.lit(polarity).at(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn shift_composes() {
        let lit = Lit::from_index(3, false).at(1);
        assert_eq!(lit.shift(0), lit);
        assert_eq!(lit.shift(2).shift(-2), lit);
        assert_eq!(lit.shift(1).frame(), 2);
        assert_eq!(lit.shift(1).var(), lit.var());
        assert_eq!(lit.shift(1).is_negative(), lit.is_negative());
    }

    #[test]
    fn negation_involution() {
        let lit = Lit::from_index(7, true).at(-1);
        assert_eq!(!!lit, lit);
        assert_eq!((!lit).frame(), lit.frame());
        assert_ne!(!lit, lit);
    }

    proptest! {
        #[test]
        fn dimacs_roundtrip(number in prop_oneof![-1000isize..=-1, 1isize..=1000]) {
            prop_assert_eq!(Lit::from_dimacs(number).to_dimacs(), number);
        }

        #[test]
        fn xor_matches_negation(lit in strategy::lit(0..100usize, -2i32..4)) {
            prop_assert_eq!(lit ^ true, !lit);
            prop_assert_eq!(lit ^ false, lit);
        }
    }
}
