use crate::matrix::Matrix;
use std::fmt::{Debug, Display, Formatter, Write};

const LIMIT_ROWS: usize = 6;
const LIMIT_COLS: usize = 10;

fn fmt_separated_max<I, T>(
    mut iter: I,
    len: usize,
    max: usize,
    f: &mut Formatter,
    sep: &str,
    fmt: &mut impl FnMut(T, &mut Formatter) -> std::fmt::Result,
) -> std::fmt::Result
where
    I: Iterator<Item = T>,
{
    let (head, skipped) = if len > max {
        (max / 2, len - (max / 2) * 2)
    } else {
        (len, 0)
    };
    for i in 0..head {
        let Some(el) = iter.next() else { break };
        if i > 0 {
            f.write_str(sep)?;
        }
        fmt(el, f)?;
    }
    if skipped == 0 {
        return Ok(());
    }
    f.write_str(sep)?;
    write!(f, "...({skipped} hidden)")?;
    for el in iter.skip(skipped) {
        f.write_str(sep)?;
        fmt(el, f)?;
    }
    Ok(())
}

fn fmt_rows<T>(
    m: &Matrix<T>,
    f: &mut Formatter,
    fmt_el: &mut impl FnMut(&T, &mut Formatter) -> std::fmt::Result,
) -> std::fmt::Result {
    f.write_char('[')?;
    if !m.is_empty() {
        f.write_str("\n   ")?;
        fmt_separated_max(0..m.rows(), m.rows(), LIMIT_ROWS, f, ",\n   ", &mut |row, f| {
            f.write_char('[')?;
            let cols = (0..m.cols()).map(|col| &m[(row, col)]);
            fmt_separated_max(cols, m.cols(), LIMIT_COLS, f, ", ", &mut *fmt_el)?;
            f.write_char(']')
        })?;
        f.write_char('\n')?;
    }
    f.write_char(']')
}

impl<T: Debug> Debug for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fmt_rows(self, f, &mut |el, f| Debug::fmt(el, f))?;
        write!(
            f,
            " dtype={} dims=({}, {}) transposed={}",
            std::any::type_name::<T>(),
            self.rows(),
            self.cols(),
            self.is_transposed()
        )
    }
}

impl<T: Display> Display for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let precision = f.precision().unwrap_or(3);
        writeln!(
            f,
            "Matrix ({}x{}, transposed={})",
            self.rows(),
            self.cols(),
            self.is_transposed()
        )?;
        fmt_rows(self, f, &mut |el, f| write!(f, "{el:>8.precision$}"))
    }
}
