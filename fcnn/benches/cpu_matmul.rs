#[macro_use]
extern crate bencher;

use bencher::Bencher;
use fcnn::util::bench::*;

macro_rules! impl_bench {
    ($name:ident, $ty:ty, $size:expr, $transpose_a:literal, $method:ident) => {
        fn $name(bench: &mut Bencher) {
            let [a, b] = get_square_matrices::<$ty>($size);
            let a = if $transpose_a { a.into_transposed() } else { a };
            bench.iter(|| a.$method(&b))
        }
    };
}

impl_bench!(cpu_f32_lg, f32, SIZE_LG, false, matmul);
impl_bench!(cpu_f32_md, f32, SIZE_MD, false, matmul);
impl_bench!(cpu_f32_sm, f32, SIZE_SM, false, matmul);
benchmark_group!(cpu_f32, cpu_f32_lg, cpu_f32_md, cpu_f32_sm);

impl_bench!(cpu_f64_lg, f64, SIZE_LG, false, matmul);
impl_bench!(cpu_f64_md, f64, SIZE_MD, false, matmul);
impl_bench!(cpu_f64_sm, f64, SIZE_SM, false, matmul);
benchmark_group!(cpu_f64, cpu_f64_lg, cpu_f64_md, cpu_f64_sm);

impl_bench!(cpu_f32_md_transpose_a, f32, SIZE_MD, true, matmul);
impl_bench!(cpu_f32_sm_transpose_a, f32, SIZE_SM, true, matmul);
benchmark_group!(cpu_f32_transpose_a, cpu_f32_md_transpose_a, cpu_f32_sm_transpose_a);

impl_bench!(naive_f32_md, f32, SIZE_MD, false, matmul_naive);
impl_bench!(naive_f32_sm, f32, SIZE_SM, false, matmul_naive);
benchmark_group!(naive_f32, naive_f32_md, naive_f32_sm);

benchmark_main!(cpu_f32, cpu_f64, cpu_f32_transpose_a, naive_f32);
