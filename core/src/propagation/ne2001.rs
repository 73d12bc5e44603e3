//! Binding onto the native NE2001 electron-density library.
//!
//! Enabled with the `ne2001` feature; the build script adds
//! `NE2001_LIB_DIR` to the link search path. The library reads its model
//! tables from a data directory on every call.

use super::ElectronDensityModel;
use crate::prelude::{SurveyError, SurveyResult};
use std::os::raw::{c_char, c_float, c_int};
use std::path::Path;
use std::sync::Mutex;

#[link(name = "ne2001")]
extern "C" {
    fn dm_(
        dist: *mut c_float,
        gl: *mut c_float,
        gb: *mut c_float,
        ndir: *mut c_int,
        dmpsr: *mut c_float,
        inpath: *mut c_char,
        linpath: *mut c_int,
    ) -> c_float;

    fn dmdsm_(
        gl: *mut c_float,
        gb: *mut c_float,
        ndir: *mut c_int,
        dmpsr: *mut c_float,
        dist: *mut c_float,
        limit: *mut c_char,
        sm: *mut c_float,
        smtau: *mut c_float,
        smtheta: *mut c_float,
        smiso: *mut c_float,
        inpath: *mut c_char,
        linpath: *mut c_int,
    ) -> c_int;
}

/// Integrate from the observer out to a given distance.
const NDIR_DISTANCE_TO_DM: c_int = 4;
const NDIR_SCATTERING: c_int = -1;

pub struct Ne2001 {
    inpath: Vec<u8>,
    // The Fortran routines keep state in COMMON blocks.
    guard: Mutex<()>,
}

impl Ne2001 {
    /// Points the model at the directory holding its `.inp` tables.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> SurveyResult<Self> {
        let dir = data_dir.as_ref();
        if !dir.is_dir() {
            return Err(SurveyError::InvalidConfig(format!(
                "NE2001 data directory {} does not exist",
                dir.display()
            )));
        }
        let mut inpath = format!("{}/", dir.display()).into_bytes();
        inpath.push(0);
        Ok(Self {
            inpath,
            guard: Mutex::new(()),
        })
    }

    fn path_buffer(&self) -> (Vec<u8>, c_int) {
        let len = (self.inpath.len() - 1) as c_int;
        (self.inpath.clone(), len)
    }
}

impl ElectronDensityModel for Ne2001 {
    fn dispersion_measure(&self, dist_kpc: f64, gl_deg: f64, gb_deg: f64) -> f64 {
        let _lock = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let (mut inpath, mut linpath) = self.path_buffer();
        let mut dist = dist_kpc as c_float;
        let mut gl = gl_deg as c_float;
        let mut gb = gb_deg as c_float;
        let mut ndir = NDIR_DISTANCE_TO_DM;
        let mut dmpsr: c_float = 0.0;

        // SAFETY: every pointer refers to a live local for the duration of
        // the call and the path buffer is NUL-terminated.
        let dm = unsafe {
            dm_(
                &mut dist,
                &mut gl,
                &mut gb,
                &mut ndir,
                &mut dmpsr,
                inpath.as_mut_ptr() as *mut c_char,
                &mut linpath,
            )
        };
        f64::from(dm)
    }

    fn scattering_parameters(&self, gl_rad: f64, gb_rad: f64, dist_kpc: f64) -> (f64, f64) {
        let _lock = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let (mut inpath, mut linpath) = self.path_buffer();
        let mut gl = gl_rad as c_float;
        let mut gb = gb_rad as c_float;
        let mut ndir = NDIR_SCATTERING;
        let mut dmpsr: c_float = 0.0;
        let mut dist = dist_kpc as c_float;
        let mut limit = [b' ' as c_char, 0];
        let mut sm: c_float = 0.0;
        let mut smtau: c_float = 0.0;
        let mut smtheta: c_float = 0.0;
        let mut smiso: c_float = 0.0;

        // SAFETY: as above; outputs are written into the locals only.
        unsafe {
            dmdsm_(
                &mut gl,
                &mut gb,
                &mut ndir,
                &mut dmpsr,
                &mut dist,
                limit.as_mut_ptr(),
                &mut sm,
                &mut smtau,
                &mut smtheta,
                &mut smiso,
                inpath.as_mut_ptr() as *mut c_char,
                &mut linpath,
            );
        }
        (f64::from(sm), f64::from(smtau))
    }
}
