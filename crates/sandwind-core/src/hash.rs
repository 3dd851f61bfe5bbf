//! String seed hashing
//!
//! Every seeded generator in SandWind derives its 32-bit state from a string
//! key such as `"dunes-page-v1:cinematic:signals"`. The hash is FNV-1a over
//! UTF-16 code units so that keys built from the same text always land on the
//! same state, whatever produced the string.

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Hash a string seed into a 32-bit value (order-sensitive, full-string fold)
pub fn hash_seed(value: &str) -> u32 {
    value.encode_utf16().fold(FNV_OFFSET, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash a string seed into `[0, 1)`
pub fn hash_seed_unit(value: &str) -> f64 {
    f64::from(hash_seed(value)) / 4_294_967_296.0
}
