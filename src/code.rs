// Copyright (c) 2017-2021 Fabian Schuiki

//! Identifier codes
//!
//! VCD refers to every traced variable through a short identifier code made up
//! of the printable ASCII characters `!` through `~`. This module hands out
//! these codes as the bijective base-94 numerals of 0, 1, 2, ..., such that
//! codes are as short as possible and never collide.

/// The first character of the code alphabet.
const FIRST: u8 = b'!';

/// The number of characters in the code alphabet.
pub const RADIX: u64 = 94;

/// Compute the identifier code of the `n`-th traced variable.
pub fn encode(n: u64) -> String {
    let mut digits = Vec::new();
    let mut m = n as u128 + 1;
    while m > 0 {
        m -= 1;
        digits.push(FIRST + (m % RADIX as u128) as u8);
        m /= RADIX as u128;
    }
    digits.reverse();
    // All digits are printable ASCII.
    digits.into_iter().map(char::from).collect()
}

/// Recover the index of an identifier code produced by [`encode`].
///
/// Returns `None` if the code is empty, contains characters outside of the
/// alphabet, or does not fit into a `u64`.
pub fn decode(code: &str) -> Option<u64> {
    if code.is_empty() {
        return None;
    }
    let mut m: u64 = 0;
    for c in code.bytes() {
        if c < FIRST || c > b'~' {
            return None;
        }
        m = m
            .checked_mul(RADIX)?
            .checked_add((c - FIRST) as u64 + 1)?;
    }
    Some(m - 1)
}

/// A generator for the sequence of identifier codes.
///
/// Every trace file gets its own generator, which starts out at `!`.
#[derive(Debug, Default)]
pub struct CodeGenerator {
    next: u64,
}

impl CodeGenerator {
    /// Create a generator that starts at the first code.
    pub fn new() -> Self {
        Default::default()
    }

    /// Return the number of codes handed out so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

impl Iterator for CodeGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let code = encode(self.next);
        self.next += 1;
        Some(code)
    }
}
