//! Associated Legendre polynomials
//!
//! Evaluates `P_n^m(x)` for `0 <= m <= n` with the Condon-Shortley phase,
//! using the closed form for `P_m^m` and the standard three-term recurrence
//! in the degree. Stable over the small degrees used for SH fitting.

/// Associated Legendre polynomial `P_n^m(x)`, Condon-Shortley phase included.
///
/// `x` must lie in `[-1, 1]`; callers pass `cos(theta)`.
pub fn assoc_legendre(n: u32, m: u32, x: f64) -> f64 {
    debug_assert!(m <= n);
    debug_assert!((-1.0..=1.0).contains(&x));

    // P_m^m(x) = (-1)^m (2m - 1)!! (1 - x^2)^(m/2)
    let mut pmm = 1.0;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).sqrt();
        let mut odd = 1.0;
        for _ in 0..m {
            pmm *= -odd * somx2;
            odd += 2.0;
        }
    }
    if n == m {
        return pmm;
    }

    // P_{m+1}^m(x) = x (2m + 1) P_m^m(x)
    let mut pnm1 = pmm;
    let mut pnm = x * (2 * m + 1) as f64 * pmm;
    if n == m + 1 {
        return pnm;
    }

    // (n - m) P_n^m = x (2n - 1) P_{n-1}^m - (n + m - 1) P_{n-2}^m
    for l in (m + 2)..=n {
        let next = (x * (2 * l - 1) as f64 * pnm - (l + m - 1) as f64 * pnm1)
            / (l - m) as f64;
        pnm1 = pnm;
        pnm = next;
    }
    pnm
}
