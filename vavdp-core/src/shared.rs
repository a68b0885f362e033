//! Thread-safe driver handle.
//!
//! libva may call a driver from any thread. `SharedDriver` serialises every
//! entry point behind one lock and turns results into VA status codes.

use crate::driver::Driver;
use crate::error::{status_of, VaError};
use crate::va::*;
use parking_lot::Mutex;

pub struct SharedDriver {
    inner: Mutex<Option<Driver>>,
}

impl SharedDriver {
    pub fn new(driver: Driver) -> Self {
        Self {
            inner: Mutex::new(Some(driver)),
        }
    }

    /// Run an entry point and keep its output.
    pub fn call<T, F>(&self, f: F) -> Result<T, VAStatus>
    where
        F: FnOnce(&mut Driver) -> Result<T, VaError>,
    {
        let mut guard = self.inner.lock();
        let driver = guard.as_mut().ok_or(VA_STATUS_ERROR_INVALID_DISPLAY)?;
        f(driver).map_err(|e| e.status())
    }

    /// Run an entry point for its status only.
    pub fn with<T, F>(&self, f: F) -> VAStatus
    where
        F: FnOnce(&mut Driver) -> Result<T, VaError>,
    {
        let mut guard = self.inner.lock();
        match guard.as_mut() {
            Some(driver) => status_of(&f(driver)),
            None => VA_STATUS_ERROR_INVALID_DISPLAY,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lock().is_none()
    }

    /// Tear the driver down. Later calls report an invalid display.
    pub fn terminate(&self) -> VAStatus {
        let Some(driver) = self.inner.lock().take() else {
            return VA_STATUS_ERROR_INVALID_DISPLAY;
        };
        status_of(&driver.terminate())
    }
}
