use num_traits::{Float, NumAssignOps};
use std::fmt::{Debug, Display};

/// Scalar element type stored in a [`Matrix`](crate::matrix::Matrix). Only IEEE floats
/// implement it; the conversions are plain `as` casts and would truncate for integers.
pub trait DType: 'static + Copy + Default + Debug + Display + Send + Sync + NumAssignOps {
    const ZERO: Self;
    const ONE: Self;
    fn from_f64(val: f64) -> Self;
    fn from_usize(val: usize) -> Self;
    fn as_f64(self) -> f64;
}

/// Floating point element type with a strided general matrix multiplication kernel.
pub trait DTypeFloat: DType + Float {
    /// Computes `c := alpha * a * b + beta * c` where `a` is `m x k`, `b` is `k x n` and `c` is
    /// `m x n`. Every operand is addressed through its own row and column stride, which is how
    /// transposed matrices are read without moving their data.
    ///
    /// # Safety
    ///
    /// The pointers must be valid for every element reachable through the given dimensions
    /// and strides, and `c` must not alias `a` or `b`.
    unsafe fn gemm(
        m: usize,
        k: usize,
        n: usize,
        alpha: Self,
        a: *const Self,
        rsa: isize,
        csa: isize,
        b: *const Self,
        rsb: isize,
        csb: isize,
        beta: Self,
        c: *mut Self,
        rsc: isize,
        csc: isize,
    );
}

macro_rules! impl_dtype {
    ($ty:ty, $gemm:ident) => {
        impl DType for $ty {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            #[inline]
            fn from_f64(val: f64) -> Self {
                val as $ty
            }
            #[inline]
            fn from_usize(val: usize) -> Self {
                val as $ty
            }
            #[inline]
            fn as_f64(self) -> f64 {
                self as f64
            }
        }

        impl DTypeFloat for $ty {
            #[inline]
            unsafe fn gemm(
                m: usize,
                k: usize,
                n: usize,
                alpha: Self,
                a: *const Self,
                rsa: isize,
                csa: isize,
                b: *const Self,
                rsb: isize,
                csb: isize,
                beta: Self,
                c: *mut Self,
                rsc: isize,
                csc: isize,
            ) {
                unsafe {
                    matrixmultiply::$gemm(m, k, n, alpha, a, rsa, csa, b, rsb, csb, beta, c, rsc, csc);
                }
            }
        }
    };
}

impl_dtype!(f32, sgemm);
impl_dtype!(f64, dgemm);
