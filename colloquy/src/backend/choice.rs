use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

/// A `Choice` is the discriminant transmitted by the party that [`choose`](crate::Chan::choose)s
/// between the two branches of a [`Choose`](crate::Protocol::Choose), so that the party at the
/// other end can learn which branch of its [`Offer`](crate::Protocol::Offer) to take.
///
/// Unless you are implementing a [`backend`](crate::backend), you do not need to interact with
/// `Choice`s directly. However, all backends must implement [`TransmitChoice`] and
/// [`ReceiveChoice`] in order to support the `Choose` and `Offer` constructs.
///
/// [`TransmitChoice`]: crate::backend::TransmitChoice
/// [`ReceiveChoice`]: crate::backend::ReceiveChoice
///
/// # Examples
///
/// A `Choice` can be constructed from the bytes `0` and `1`:
///
/// ```
/// use std::convert::TryInto;
/// use colloquy::backend::Choice;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let left: Choice = 0_u8.try_into()?;
/// let right: Choice = 1_u8.try_into()?;
///
/// assert_eq!(left, Choice::Left);
/// assert_eq!(right, Choice::Right);
/// # Ok(())
/// # }
/// ```
///
/// But not from anything greater:
///
/// ```
/// # use std::convert::TryInto;
/// # use colloquy::backend::Choice;
/// #
/// for i in 2..=u8::MAX {
///     let attempt: Result<Choice, _> = i.try_into();
///     assert!(attempt.is_err());
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Choice {
    /// The first branch.
    Left,
    /// The second branch.
    Right,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// When attempting to construct a [`Choice`] via [`try_into`](std::convert::TryInto::try_into) or
/// [`try_from`](TryFrom::try_from), this error is thrown when the byte names neither branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
#[error("choice {choice} is invalid for a binary branch")]
pub struct OutOfBoundsChoiceError {
    choice: u8,
}

impl TryFrom<u8> for Choice {
    type Error = OutOfBoundsChoiceError;

    fn try_from(choice: u8) -> Result<Self, Self::Error> {
        match choice {
            0 => Ok(Choice::Left),
            1 => Ok(Choice::Right),
            _ => Err(OutOfBoundsChoiceError { choice }),
        }
    }
}

impl From<Choice> for u8 {
    fn from(choice: Choice) -> u8 {
        match choice {
            Choice::Left => 0,
            Choice::Right => 1,
        }
    }
}

impl PartialEq<u8> for Choice {
    fn eq(&self, other: &u8) -> bool {
        u8::from(*self) == *other
    }
}
