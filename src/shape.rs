//! Array shapes, printed the way tuples read in error messages.
use smallvec::SmallVec;
use std::fmt;

/// The extent of each axis of a value. A scalar has the empty shape `()`.
///
/// Most attributes are at most 4-d, so dims are stored inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(SmallVec<[usize; 4]>);

impl Shape {
    pub fn scalar() -> Self { Self::default() }

    pub fn dims(&self) -> &[usize] { &self.0 }

    /// Number of axes.
    pub fn rank(&self) -> usize { self.0.len() }

    /// The length of a 1-d shape.
    pub fn length(&self) -> Option<usize> {
        match self.dims() {
            [n] => Some(*n),
            _ => None,
        }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self { Self(SmallVec::from_slice(dims)) }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self { Self(SmallVec::from_vec(dims)) }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self { Self::from(&dims[..]) }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dims() {
            [] => write!(f, "()"),
            [n] => write!(f, "({n},)"),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![], "()")]
    #[case(vec![3], "(3,)")]
    #[case(vec![3, 4], "(3, 4)")]
    #[case(vec![3, 6, 3], "(3, 6, 3)")]
    fn test_tuple_display(#[case] dims: Vec<usize>, #[case] expected: &str) {
        assert_eq!(Shape::from(dims).to_string(), expected);
    }

    #[test]
    fn test_length_only_for_1d() {
        assert_eq!(Shape::from([5]).length(), Some(5));
        assert_eq!(Shape::from([5, 1]).length(), None);
        assert_eq!(Shape::scalar().length(), None);
        assert_eq!(Shape::scalar().rank(), 0);
    }
}
