//! Galactic and equatorial coordinate conversions.
//!
//! The rotations use the J2000 galactic north pole and are exact inverses of
//! each other, but they are not a substitute for a full astrometric
//! reduction: precession and nutation are ignored. Over a large population
//! the resulting over- and under-estimates average out.

use crate::prelude::{SurveyError, SurveyResult};
use ndarray::{Array1, ArrayView1, Zip};

/// Distance from the Sun to the galactic centre [Gpc].
pub const R_SUN_GPC: f64 = 8.5e-6;

/// Right ascension of the galactic north pole [hours].
const RA_NGP_HOURS: f64 = 12.940_633_3;
/// Declination of the galactic north pole [deg].
const DEC_NGP_DEG: f64 = 27.128_25;
/// Galactic longitude of the north celestial pole [deg].
const L_NCP_DEG: f64 = 123.932;

struct Pole {
    a_ngp: f64,
    l_ncp: f64,
    sin_d: f64,
    cos_d: f64,
}

impl Pole {
    fn j2000() -> Self {
        let d_ngp = DEC_NGP_DEG.to_radians();
        Self {
            a_ngp: (RA_NGP_HOURS * 15.0).to_radians(),
            l_ncp: L_NCP_DEG.to_radians(),
            sin_d: d_ngp.sin(),
            cos_d: d_ngp.cos(),
        }
    }
}

/// Folds an angle in degrees onto [-90, 90] the way a latitude is reported.
fn fold_latitude(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 270.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Projects galactic coordinates onto galactic Cartesian axes centred on the
/// galactic centre.
///
/// Angles are in degrees, `dist` in Gpc; returns `(x, y, z)` in Gpc.
pub fn galactic_to_xyz(
    gl: ArrayView1<f64>,
    gb: ArrayView1<f64>,
    dist: ArrayView1<f64>,
) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
    let n = gl.len();
    let mut gx = Array1::zeros(n);
    let mut gy = Array1::zeros(n);
    let mut gz = Array1::zeros(n);

    Zip::from(&mut gx)
        .and(&mut gy)
        .and(&mut gz)
        .and(&gl)
        .and(&gb)
        .and(&dist)
        .for_each(|x, y, z, &l, &b, &d| {
            let l = l.rem_euclid(360.0).to_radians();
            let b = b.rem_euclid(360.0).to_radians();
            *x = d * b.cos() * l.sin();
            *y = R_SUN_GPC - d * b.cos() * l.cos();
            *z = d * b.sin();
        });

    (gx, gy, gz)
}

/// Converts galactic longitude/latitude [deg] to right ascension and
/// declination [deg].
///
/// Right ascension lands in [0, 360), declination in [-90, 90].
pub fn galactic_to_equatorial(
    gl: ArrayView1<f64>,
    gb: ArrayView1<f64>,
) -> (Array1<f64>, Array1<f64>) {
    let pole = Pole::j2000();
    let mut ra = Array1::zeros(gl.len());
    let mut dec = Array1::zeros(gl.len());

    Zip::from(&mut ra)
        .and(&mut dec)
        .and(&gl)
        .and(&gb)
        .for_each(|ra, dec, &l, &b| {
            let l = l.to_radians();
            let b = b.to_radians();
            let (sb, cb) = b.sin_cos();

            let y = cb * (pole.l_ncp - l).sin();
            let x = pole.cos_d * sb - pole.sin_d * cb * (pole.l_ncp - l).cos();
            *ra = ((y.atan2(x) + pole.a_ngp).to_degrees()).rem_euclid(360.0);

            let d = (pole.sin_d * sb + pole.cos_d * cb * (pole.l_ncp - l).cos()).asin();
            *dec = fold_latitude(d.to_degrees());
        });

    (ra, dec)
}

/// Converts right ascension and declination [deg] to galactic longitude and
/// latitude [deg].
///
/// Longitude is shifted into (-180, 180], latitude into [-90, 90].
pub fn equatorial_to_galactic(
    ra: ArrayView1<f64>,
    dec: ArrayView1<f64>,
) -> (Array1<f64>, Array1<f64>) {
    let pole = Pole::j2000();
    let mut gl = Array1::zeros(ra.len());
    let mut gb = Array1::zeros(ra.len());

    Zip::from(&mut gl)
        .and(&mut gb)
        .and(&ra)
        .and(&dec)
        .for_each(|gl, gb, &a, &d| {
            let a = a.to_radians();
            let (sd, cd) = d.to_radians().sin_cos();

            let y = cd * (a - pole.a_ngp).sin();
            let x = pole.cos_d * sd - pole.sin_d * cd * (a - pole.a_ngp).cos();
            let l = (pole.l_ncp - y.atan2(x)).to_degrees().rem_euclid(360.0);
            *gl = if l > 180.0 { l - 360.0 } else { l };

            let b = (pole.sin_d * sd + pole.cos_d * cd * (a - pole.a_ngp).cos()).asin();
            *gb = fold_latitude(b.to_degrees());
        });

    (gl, gb)
}

/// Parses sexagesimal `hh:mm:ss` right ascension and `dd:mm:ss` declination
/// strings into fractional degrees.
pub fn frac_deg(ra: &str, dec: &str) -> SurveyResult<(f64, f64)> {
    let [rh, rm, rs] = sexagesimal(ra)?;
    let ra_deg = rh * 15.0 + rm / 4.0 + rs / 240.0;

    let [dd, dm, ds] = sexagesimal(dec)?;
    let sign = if dec.trim_start().starts_with('-') {
        -1.0
    } else {
        1.0
    };
    let dec_deg = dd + sign * dm / 60.0 + sign * ds / 3600.0;

    Ok((ra_deg, dec_deg))
}

fn sexagesimal(text: &str) -> SurveyResult<[f64; 3]> {
    let parts = text
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| SurveyError::InvalidInput(format!("`{}`: {}", text, err)))?;

    match parts.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(SurveyError::InvalidInput(format!(
            "`{}` is not of the form xx:mm:ss",
            text
        ))),
    }
}

/// Converts a luminosity in erg/s to Watts.
pub fn ergspers_to_watts(e: f64) -> f64 {
    e * 1e-7
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn xyz_places_sun_on_positive_y_axis() {
        let (x, y, z) = galactic_to_xyz(
            array![0.0].view(),
            array![0.0].view(),
            array![0.0].view(),
        );
        assert_eq!(x[0], 0.0);
        assert_abs_diff_eq!(y[0], R_SUN_GPC);
        assert_eq!(z[0], 0.0);
    }

    #[test]
    fn xyz_treats_longitude_modulo_360() {
        let dist = array![1.0, 1.0];
        let (x, y, z) = galactic_to_xyz(
            array![90.0, 450.0].view(),
            array![30.0, 30.0].view(),
            dist.view(),
        );
        assert_abs_diff_eq!(x[0], x[1], epsilon = 1e-12);
        assert_abs_diff_eq!(y[0], y[1], epsilon = 1e-12);
        assert_abs_diff_eq!(z[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn galactic_centre_maps_near_sagittarius() {
        // Sgr A* sits at (266.40, -28.94); the fixed pole longitude puts us
        // within a degree of it.
        let (ra, dec) = galactic_to_equatorial(array![0.0].view(), array![0.0].view());
        assert_abs_diff_eq!(ra[0], 267.055, epsilon = 0.01);
        assert_abs_diff_eq!(dec[0], -29.788, epsilon = 0.01);
        assert_abs_diff_eq!(ra[0], 266.40, epsilon = 1.0);
        assert_abs_diff_eq!(dec[0], -28.94, epsilon = 1.0);
    }

    #[test]
    fn equatorial_output_ranges() {
        let gl = Array1::linspace(-180.0, 359.0, 50);
        let gb = Array1::linspace(-89.0, 89.0, 50);
        let (ra, dec) = galactic_to_equatorial(gl.view(), gb.view());
        assert!(ra.iter().all(|&r| (0.0..360.0).contains(&r)));
        assert!(dec.iter().all(|&d| (-90.0..=90.0).contains(&d)));
    }

    #[test]
    fn galactic_equatorial_round_trip() {
        let gl = array![-170.0, -90.0, -12.5, 0.0, 33.3, 120.0, 179.0];
        let gb = array![-80.0, -45.0, -5.0, 0.0, 10.0, 60.0, 85.0];
        let (ra, dec) = galactic_to_equatorial(gl.view(), gb.view());
        let (gl_back, gb_back) = equatorial_to_galactic(ra.view(), dec.view());

        for i in 0..gl.len() {
            assert_abs_diff_eq!(gl_back[i], gl[i], epsilon = 1e-6);
            assert_abs_diff_eq!(gb_back[i], gb[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn frac_deg_parses_sexagesimal() {
        let (ra, dec) = frac_deg("19:06:53", "-40:37:14").unwrap();
        assert_abs_diff_eq!(ra, 286.720_833, epsilon = 1e-5);
        assert_abs_diff_eq!(dec, -40.620_556, epsilon = 1e-5);
    }

    #[test]
    fn frac_deg_rejects_malformed_input() {
        assert!(frac_deg("19:06", "10:00:00").is_err());
        assert!(frac_deg("aa:bb:cc", "10:00:00").is_err());
    }

    #[test]
    fn erg_conversion() {
        assert_eq!(ergspers_to_watts(1e7), 1.0);
    }
}
