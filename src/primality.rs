//! Miller-Rabin probable-prime test over `u64`.
//!
//! Each round draws a fresh witness from the caller's RNG, so a composite
//! survives `k` rounds with probability at most `4^-k`. Primes always pass.

use rand::Rng;

/// Round count past which a wrong verdict is less likely than a hardware fault
pub const REFERENCE_ROUNDS: u32 = 40;

/// `a * b mod m` through a 128-bit product, so no operand below `m` overflows.
#[inline]
pub fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// `base^exp mod m` by square-and-multiply.
pub fn mod_pow(base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1;
    let mut base = base % m;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Split `d` (non-zero) into `(r, s)` with `d = 2^r * s` and `s` odd.
pub fn decompose(d: u64) -> (u32, u64) {
    debug_assert!(d != 0);
    let mut r = 0;
    let mut s = d;
    while s % 2 == 0 {
        r += 1;
        s /= 2;
    }
    (r, s)
}

/// Probabilistically decide whether `n` is prime using `k` Miller-Rabin rounds.
///
/// Returns `false` as soon as one witness proves `n` composite. With `k == 0`
/// no witness is drawn and any odd `n > 3` is reported probably prime: zero
/// rounds of evidence never contradict primality.
pub fn is_probably_prime<R: Rng + ?Sized>(n: u64, k: u32, rng: &mut R) -> bool {
    if n == 2 || n == 3 {
        return true;
    }
    if n < 2 || n % 2 == 0 {
        return false;
    }

    let (r, s) = decompose(n - 1);

    'witness: for _ in 0..k {
        let a = rng.gen_range(2..=n - 2);
        let mut x = mod_pow(a, s, n);
        if x == 1 || x == n - 1 {
            continue;
        }

        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }

        return false;
    }

    true
}
