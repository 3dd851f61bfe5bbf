//! Lattice value noise and a divergence-free flow field derived from it

use glam::Vec2;

/// Half-width of the central difference used to estimate the noise gradient
const GRADIENT_EPSILON: f64 = 0.55;

fn smooth(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(from: f64, to: f64, amount: f64) -> f64 {
    from + (to - from) * amount
}

/// Map a 32-bit hash to [-1, 1)
fn unit(hash: u32) -> f64 {
    (f64::from(hash) / 4_294_967_296.0) * 2.0 - 1.0
}

fn lattice(v: f64) -> u32 {
    (v.floor() as i64) as i32 as u32
}

fn hash1(x: u32, seed: u32) -> f64 {
    let mut hash = seed ^ x.wrapping_mul(1_597_334_677);
    hash = (hash ^ (hash >> 15)).wrapping_mul(2_246_822_519);
    hash ^= hash >> 13;
    unit(hash)
}

fn hash3(x: u32, y: u32, z: u32, seed: u32) -> f64 {
    let mut hash = seed
        ^ x.wrapping_mul(374_761_393)
        ^ y.wrapping_mul(668_265_263)
        ^ z.wrapping_mul(2_147_483_647);
    hash = (hash ^ (hash >> 13)).wrapping_mul(1_274_126_177);
    hash ^= hash >> 16;
    unit(hash)
}

/// Smooth 1D value noise in [-1, 1]
pub fn value_noise_1d(x: f64, seed: u32) -> f64 {
    let x0 = lattice(x);
    let x1 = x0.wrapping_add(1);
    let tx = smooth(x - x.floor());

    lerp(hash1(x0, seed), hash1(x1, seed), tx)
}

/// Smooth 3D value noise in [-1, 1] (trilinear blend of smoothed lattice corners)
pub fn value_noise_3d(x: f64, y: f64, z: f64, seed: u32) -> f64 {
    let (x0, y0, z0) = (lattice(x), lattice(y), lattice(z));
    let (x1, y1, z1) = (x0.wrapping_add(1), y0.wrapping_add(1), z0.wrapping_add(1));

    let tx = smooth(x - x.floor());
    let ty = smooth(y - y.floor());
    let tz = smooth(z - z.floor());

    let x00 = lerp(hash3(x0, y0, z0, seed), hash3(x1, y0, z0, seed), tx);
    let x10 = lerp(hash3(x0, y1, z0, seed), hash3(x1, y1, z0, seed), tx);
    let x01 = lerp(hash3(x0, y0, z1, seed), hash3(x1, y0, z1, seed), tx);
    let x11 = lerp(hash3(x0, y1, z1, seed), hash3(x1, y1, z1, seed), tx);

    lerp(lerp(x00, x10, ty), lerp(x01, x11, ty), tz)
}

/// Unit flow direction at a surface position and time.
///
/// The direction is the perpendicular of the noise gradient, so the field
/// is divergence-free: noise alone never makes particles bunch up or thin out.
pub fn sample_flow_vector(
    x: f64,
    y: f64,
    time_sec: f64,
    seed: u32,
    spatial_scale: f64,
    temporal_scale: f64,
) -> Vec2 {
    let nx = x * spatial_scale;
    let ny = y * spatial_scale;
    let nz = time_sec * temporal_scale;

    let dn_dx = value_noise_3d(nx + GRADIENT_EPSILON, ny, nz, seed)
        - value_noise_3d(nx - GRADIENT_EPSILON, ny, nz, seed);
    let dn_dy = value_noise_3d(nx, ny + GRADIENT_EPSILON, nz, seed)
        - value_noise_3d(nx, ny - GRADIENT_EPSILON, nz, seed);

    let flow_x = dn_dy;
    let flow_y = -dn_dx;

    let length = flow_x.hypot(flow_y);
    let length = if length > 0.0 { length } else { 1.0 };

    Vec2::new((flow_x / length) as f32, (flow_y / length) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_1d_is_deterministic() {
        let a = value_noise_1d(2.3, 7);
        let b = value_noise_1d(2.3, 7);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn noise_1d_range_and_continuity() {
        let mut prev = value_noise_1d(-5.0, 99);
        let mut x = -5.0;
        while x < 5.0 {
            x += 0.01;
            let v = value_noise_1d(x, 99);
            assert!((-1.0..=1.0).contains(&v));
            assert!((v - prev).abs() < 0.05, "jump at {x}");
            prev = v;
        }
    }

    #[test]
    fn noise_1d_matches_lattice_at_integers() {
        assert_eq!(value_noise_1d(3.0, 11), hash1(3, 11));
        assert_eq!(value_noise_1d(-2.0, 11), hash1((-2i32) as u32, 11));
    }

    #[test]
    fn noise_seed_changes_field() {
        let differing = (0..20)
            .filter(|i| {
                let x = *i as f64 * 0.37;
                value_noise_1d(x, 1) != value_noise_1d(x, 2)
            })
            .count();
        assert!(differing > 15);
    }

    #[test]
    fn noise_3d_range() {
        for i in 0..200 {
            let t = i as f64 * 0.173;
            let v = value_noise_3d(t, t * 0.5 - 3.0, t * 1.7, 1234);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn flow_vector_is_unit_length() {
        for i in 0..200 {
            let x = i as f64 * 13.7;
            let y = 720.0 - i as f64 * 5.3;
            let flow = sample_flow_vector(x, y, i as f64 * 0.05, 42, 0.0031, 0.18);
            assert!((flow.length() - 1.0).abs() < 1e-4, "norm {} at {i}", flow.length());
        }
    }
}
