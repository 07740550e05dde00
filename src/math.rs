use num::Float;

/// Tolerance used for every fuzzy comparison
pub const MACHEPS: f64 = 1e-6;

fn macheps<F: Float>() -> F {
    F::from(MACHEPS).unwrap_or_else(F::epsilon)
}

/// Equality within `MACHEPS`. Two NaNs compare equal.
pub fn is_eq<F: Float>(a: F, b: F) -> bool {
    a == b || (a - b).abs() < macheps() || (a.is_nan() && b.is_nan())
}

pub fn is_lt<F: Float>(a: F, b: F) -> bool {
    !is_eq(a, b) && a < b
}

pub fn is_le<F: Float>(a: F, b: F) -> bool {
    is_eq(a, b) || a < b
}

pub fn is_gt<F: Float>(a: F, b: F) -> bool {
    !is_eq(a, b) && a > b
}

pub fn is_ge<F: Float>(a: F, b: F) -> bool {
    is_eq(a, b) || a > b
}

/// Similar to numpy.interp, for a single `x`. Values outside the coordinates
/// take the value of the nearest end point.
pub(crate) fn interp<F: Float>(x: F, coords: &[(F, F)]) -> F {
    if x.is_nan() {
        return F::nan();
    }

    let mut iter = coords.iter().copied().enumerate().peekable();

    while let Some((i, (x1, y1))) = iter.next() {
        // Base cases
        if i == 0 && x < x1 {
            return y1;
        }
        if iter.peek().is_none() && x > x1 {
            return y1;
        }

        let Some(&(_, (x2, y2))) = iter.peek() else {
            continue;
        };

        if x1 <= x && x <= x2 {
            if x2 == x1 {
                return y2;
            }

            return y1 + (x - x1) * (y2 - y1) / (x2 - x1);
        }
    }

    // Only reachable with a single coordinate exactly at x, or no coordinates
    coords.first().map(|&(_, y)| y).unwrap_or_else(F::nan)
}

#[test]
fn test_interp() {
    let xs = [1., 2., 3.];
    let ys = [3., 2., 0.];
    let coords: Vec<(f64, f64)> = xs.into_iter().zip(ys).collect();
    let x = [0., 1., 1.5, 2.72, 3.24];
    let got: Vec<f64> = x.iter().map(|x| interp(*x, &coords)).collect();

    assert_eq!(got, vec![3., 3., 2.5, 0.5599999999999996, 0.]);

    let coords = [(0., 0.), (1., 2.), (2., 5.), (3., 3.), (4.5, 2.)];

    assert_eq!(interp(2.5, &coords), 4.);
    assert_eq!(interp(-1., &coords), 0.);
    assert_eq!(interp(7.5, &coords), 2.);
    assert!(interp(f64::NAN, &coords).is_nan());
    assert!(interp(1.0, &[] as &[(f64, f64)]).is_nan());
}

#[test]
fn test_comparisons() {
    assert!(is_eq(0.3, 0.1 + 0.2));
    assert!(is_eq(f64::NAN, f64::NAN));
    assert!(!is_gt(0.5, 0.5 + 1e-9));
    assert!(is_ge(0.5, 0.5 + 1e-9));
    assert!(is_gt(0.0001, 0.0));
    assert!(!is_lt(0.0, 1e-9));
    assert!(is_le(0.2, 0.3));
    assert!(!is_gt(f64::NAN, 0.0));
}
