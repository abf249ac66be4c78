/// The running checksum stored in each data block header: an XOR of the
/// covered bytes taken as little-endian 32-bit words, with a short trailing
/// group folded in byte-reversed.
pub struct Checksum {
    value: u32,
    remainder: u32,
    remainder_shift: u32,
}

impl Checksum {
    #[cfg(test)]
    pub fn new() -> Checksum {
        Checksum { value: 0, remainder: 0, remainder_shift: 0 }
    }

    /// Starts from an existing checksum value instead of zero.
    pub fn with_seed(seed: u32) -> Checksum {
        Checksum { value: seed, remainder: 0, remainder_shift: 0 }
    }

    pub fn value(&self) -> u32 {
        match self.remainder_shift {
            0 => self.value,
            8 => self.value ^ self.remainder,
            16 => {
                self.value
                    ^ (self.remainder >> 8)
                    ^ ((self.remainder & 0xff) << 8)
            }
            24 => {
                self.value
                    ^ (self.remainder >> 16)
                    ^ (self.remainder & 0xff00)
                    ^ ((self.remainder & 0xff) << 16)
            }
            _ => unreachable!(),
        }
    }

    pub fn update(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.remainder |= (byte as u32) << self.remainder_shift;
            if self.remainder_shift == 24 {
                self.value ^= self.remainder;
                self.remainder = 0;
                self.remainder_shift = 0;
            } else {
                self.remainder_shift += 8;
            }
        }
    }
}

/// Computes the checksum of `buf` in one go, starting from `seed`.
pub fn calculate(buf: &[u8], seed: u32) -> u32 {
    let mut checksum = Checksum::with_seed(seed);
    checksum.update(buf);
    checksum.value()
}
