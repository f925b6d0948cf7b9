//! Wide-integer share math.
//!
//! Share conversions multiply two `u128` quantities before dividing, which
//! overflows for 18-decimal assets long before the quotient does. Products are
//! formed as 256-bit `(hi, lo)` limb pairs and divided back down.

const LO_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of two `u128` values, returned as `(hi, lo)`.
fn wide_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LO_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LO_MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    // At most 3 * (2^64 - 1), fits.
    let mid = (ll >> 64) + (lh & LO_MASK) + (hl & LO_MASK);
    let lo = (ll & LO_MASK) | (mid << 64);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// `(hi·2^128 + lo) / d` with remainder. `None` if `d == 0` or the quotient
/// does not fit in `u128` (`hi >= d`).
fn wide_div_rem(hi: u128, lo: u128, d: u128) -> Option<(u128, u128)> {
    if d == 0 || hi >= d {
        return None;
    }
    if hi == 0 {
        return Some((lo / d, lo % d));
    }
    // Restoring long division; `rem < d` holds at the top of every step.
    let mut rem = hi;
    let mut quot = 0u128;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quot <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1;
        }
    }
    Some((quot, rem))
}

/// `floor(a * b / d)`.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Option<u128> {
    let (hi, lo) = wide_mul(a, b);
    wide_div_rem(hi, lo, d).map(|(q, _)| q)
}

/// `ceil(a * b / d)`.
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Option<u128> {
    let (hi, lo) = wide_mul(a, b);
    let (q, r) = wide_div_rem(hi, lo, d)?;
    if r == 0 {
        Some(q)
    } else {
        q.checked_add(1)
    }
}
