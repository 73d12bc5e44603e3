use crate::prelude::{SurveyError, SurveyResult};
use ndarray::Array1;

macro_rules! frb_columns {
    ($($(#[$doc:meta])* $field:ident),* $(,)?) => {
        /// Per-source physical attributes stored as parallel columns.
        ///
        /// Row `i` of every column describes the same source. Columns are
        /// only ever filtered together through [`Frbs::apply_mask`].
        #[derive(Debug, Clone, PartialEq)]
        pub struct Frbs {
            $($(#[$doc])* pub $field: Array1<f64>,)*
        }

        impl Frbs {
            /// Names of every column, in declaration order.
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];

            /// A population of `n` sources with every column zeroed.
            pub fn with_len(n: usize) -> Self {
                Self {
                    $($field: Array1::zeros(n),)*
                }
            }

            fn columns(&self) -> Vec<(&'static str, &Array1<f64>)> {
                vec![$((stringify!($field), &self.$field)),*]
            }

            fn select(&self, keep: &[usize]) -> Self {
                Self {
                    $($field: keep.iter().map(|&i| self.$field[i]).collect(),)*
                }
            }
        }
    };
}

frb_columns! {
    /// Galactic longitude [deg]
    gl,
    /// Galactic latitude [deg]
    gb,
    /// Galactic Cartesian x, towards increasing longitude [Gpc]
    gx,
    /// Galactic Cartesian y, from the galactic centre through the Sun [Gpc]
    gy,
    /// Galactic Cartesian z, towards the north galactic pole [Gpc]
    gz,
    /// Right ascension [deg]
    ra,
    /// Declination [deg]
    dec,
    /// Redshift
    z,
    /// Comoving distance [Gpc]
    dist_co,
    /// Dispersion measure of the host galaxy [pc cm^-3]
    dm_host,
    /// Dispersion measure of the intergalactic medium [pc cm^-3]
    dm_igm,
    /// Dispersion measure of the Milky Way [pc cm^-3]
    dm_mw,
    /// Total dispersion measure [pc cm^-3]
    dm,
    /// Bolometric luminosity [erg/s]
    lum_bol,
    /// Spectral index
    si,
    /// Intrinsic pulse width [ms]
    w_int,
    /// Pulse width at arrival, `w_int * (1 + z)` [ms]
    w_arr,
    /// Intra-channel dispersion smearing [ms]
    t_dm,
    /// Scattering timescale [ms]
    t_scat,
    /// Sky temperature [K]
    t_sky,
    /// System temperature [K]
    t_sys,
    /// Effective pulse width [ms]
    w_eff,
    /// Peak flux density [Jy]
    s_peak,
    /// Fluence [Jy ms]
    fluence,
    /// Signal-to-noise ratio
    snr,
    /// Uniform draw on [0, 1) that places the burst inside or outside the
    /// observing window; kept when below `1 / (1 + z)`
    arrival,
}

impl Frbs {
    /// Number of sources.
    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every column holds the same number of sources.
    pub fn validate(&self) -> SurveyResult<()> {
        let expected = self.len();
        for (column, values) in self.columns() {
            let found = values.len();
            if found != expected {
                return Err(SurveyError::LengthMismatch {
                    column,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Keeps the sources where `mask` is true, filtering every column in
    /// lock-step into a new population.
    pub fn apply_mask(&self, mask: &[bool]) -> SurveyResult<Frbs> {
        self.validate()?;
        if mask.len() != self.len() {
            return Err(SurveyError::LengthMismatch {
                column: "mask",
                expected: self.len(),
                found: mask.len(),
            });
        }
        let keep: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        Ok(self.select(&keep))
    }

    /// Values of a named column, if it exists.
    pub fn column(&self, name: &str) -> Option<&Array1<f64>> {
        self.columns()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, values)| values)
    }
}
