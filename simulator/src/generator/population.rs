use anyhow::{ensure, Context};
use frbcore::math::coords::galactic_to_xyz;
use frbcore::math::cosmology::igm_dispersion_measure;
use frbcore::math::{Cosmology, Redshift};
use frbcore::propagation::{milky_way_dm, ElectronDensityModel};
use frbcore::{CosmicPopulation, Frbs};
use ndarray::Array1;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Redshift grid used to invert the comoving-volume distribution.
const GRID_POINTS: usize = 1000;

/// Configuration for generating a synthetic cosmic population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub name: String,
    pub n_sources: usize,
    /// Observing time the population stands for [days].
    pub days: f64,
    pub z_max: f64,
    /// Bolometric luminosity range [erg/s], sampled log-uniformly.
    pub lum_min: f64,
    pub lum_max: f64,
    /// Intrinsic pulse width [ms].
    pub w_mean: f64,
    pub w_std: f64,
    pub si: f64,
    /// Rest-frame host dispersion measure [pc cm^-3].
    pub dm_host: f64,
    /// IGM dispersion measure per unit redshift [pc cm^-3].
    pub dm_igm_slope: f64,
    /// Emission band [Hz].
    pub f_min: f64,
    pub f_max: f64,
    pub cosmology: Cosmology,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: "cosmic".into(),
            n_sources: 10_000,
            days: 1.0,
            z_max: 1.0,
            lum_min: 1e40,
            lum_max: 1e45,
            w_mean: 1.0,
            w_std: 0.3,
            si: -1.4,
            dm_host: 100.0,
            dm_igm_slope: 1000.0,
            f_min: 10e6,
            f_max: 10e9,
            cosmology: Cosmology::default(),
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.days > 0.0, "observing time must be positive");
        ensure!(self.z_max > 0.0, "maximum redshift must be positive");
        ensure!(
            self.lum_min > 0.0 && self.lum_max >= self.lum_min,
            "luminosity range [{}, {}] is invalid",
            self.lum_min,
            self.lum_max
        );
        ensure!(
            self.w_mean > 0.0 && self.w_std >= 0.0,
            "pulse width distribution must have a positive mean"
        );
        Ok(())
    }
}

/// Tabulated comoving distance and volume against redshift.
struct VolumeTable {
    z: Array1<f64>,
    dist_co: Array1<f64>,
    vol_co: Array1<f64>,
}

impl VolumeTable {
    fn new(z_max: f64, cosmology: Cosmology) -> anyhow::Result<Self> {
        let z = Array1::linspace(0.0, z_max, GRID_POINTS);
        let mut redshift =
            Redshift::new(z.view(), cosmology).context("tabulating comoving distances")?;
        Ok(Self {
            dist_co: redshift.dist_co(),
            vol_co: redshift.vol_co(),
            z,
        })
    }

    fn vol_max(&self) -> f64 {
        self.vol_co[GRID_POINTS - 1]
    }

    /// Redshift and comoving distance enclosing `volume`.
    fn invert(&self, volume: f64) -> (f64, f64) {
        let hi = self
            .vol_co
            .as_slice()
            .map_or(GRID_POINTS - 1, |v| v.partition_point(|&x| x < volume))
            .clamp(1, GRID_POINTS - 1);
        let lo = hi - 1;
        let span = self.vol_co[hi] - self.vol_co[lo];
        let t = if span > 0.0 {
            (volume - self.vol_co[lo]) / span
        } else {
            0.0
        };
        let lerp = |a: &Array1<f64>| a[lo] + t * (a[hi] - a[lo]);
        (lerp(&self.z), lerp(&self.dist_co))
    }
}

/// Draws an isotropic population, uniform in comoving volume out to
/// `z_max`, with Milky-Way dispersion from `model`.
pub fn generate(
    config: &GeneratorConfig,
    model: &dyn ElectronDensityModel,
    seed: u64,
) -> anyhow::Result<CosmicPopulation> {
    config.validate()?;
    let table = VolumeTable::new(config.z_max, config.cosmology)?;
    let vol_co_max = table.vol_max();

    let n = config.n_sources;
    let mut rng = StdRng::seed_from_u64(seed);
    let width = Normal::new(config.w_mean, config.w_std).context("pulse width distribution")?;
    let (log_lum_min, log_lum_max) = (config.lum_min.log10(), config.lum_max.log10());

    let mut frbs = Frbs::with_len(n);
    for i in 0..n {
        frbs.gl[i] = rng.gen_range(-180.0..180.0);
        frbs.gb[i] = (2.0 * rng.gen::<f64>() - 1.0).asin().to_degrees();

        let (z, dist_co) = table.invert(rng.gen::<f64>() * vol_co_max);
        frbs.z[i] = z;
        frbs.dist_co[i] = dist_co;

        let log_lum = if log_lum_max > log_lum_min {
            rng.gen_range(log_lum_min..log_lum_max)
        } else {
            log_lum_min
        };
        frbs.lum_bol[i] = 10f64.powf(log_lum);
        frbs.si[i] = config.si;

        let mut w_int = width.sample(&mut rng);
        while w_int <= 0.0 {
            w_int = width.sample(&mut rng);
        }
        frbs.w_int[i] = w_int;
        frbs.w_arr[i] = w_int * (1.0 + z);
        frbs.dm_host[i] = config.dm_host / (1.0 + z);
    }

    frbs.dm_igm = igm_dispersion_measure(frbs.z.view(), config.dm_igm_slope, None, &mut rng)
        .context("drawing IGM dispersion measures")?;
    frbs.dm_mw = milky_way_dm(model, frbs.dist_co.view(), frbs.gl.view(), frbs.gb.view())
        .context("computing Milky-Way dispersion measures")?;
    frbs.dm = &frbs.dm_host + &frbs.dm_igm + &frbs.dm_mw;

    let (gx, gy, gz) = galactic_to_xyz(frbs.gl.view(), frbs.gb.view(), frbs.dist_co.view());
    frbs.gx = gx;
    frbs.gy = gy;
    frbs.gz = gz;

    Ok(
        CosmicPopulation::new(&config.name, frbs, config.days * 86_400.0, vol_co_max)
            .with_emission_band(config.f_min, config.f_max),
    )
}
