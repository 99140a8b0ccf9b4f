use crate::matrix::Matrix;
use ::approx::{AbsDiffEq, RelativeEq};
use std::iter::zip;

impl<T> AbsDiffEq for Matrix<T>
where
    T: AbsDiffEq + Copy,
    T::Epsilon: Copy,
{
    type Epsilon = T::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.shape() == other.shape()
            && zip(self.row_major_iter(), other.row_major_iter())
                .all(|(a, b)| T::abs_diff_eq(&a, &b, epsilon))
    }
}

impl<T> RelativeEq for Matrix<T>
where
    T: RelativeEq + Copy,
    T::Epsilon: Copy,
{
    fn default_max_relative() -> Self::Epsilon {
        T::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: Self::Epsilon, max_relative: Self::Epsilon) -> bool {
        self.shape() == other.shape()
            && zip(self.row_major_iter(), other.row_major_iter())
                .all(|(a, b)| T::relative_eq(&a, &b, epsilon, max_relative))
    }
}
