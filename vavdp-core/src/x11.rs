// X11 - Drawable geometry through Xlib
//
// Loads libX11.so.6 at runtime and answers `DrawableProvider` queries with
// XGetGeometry. Also hands out the raw Display* the VDPAU device needs.

use crate::backend::{BackendError, BackendResult, Drawable, DrawableProvider};
use std::ffi::{c_void, CString};
use libc::{c_char, c_int, c_uint};
use std::ptr;
use thiserror::Error;

type XDisplay = *mut c_void;

type XOpenDisplayFn = unsafe extern "C" fn(*const c_char) -> XDisplay;
type XCloseDisplayFn = unsafe extern "C" fn(XDisplay) -> c_int;
type XDefaultScreenFn = unsafe extern "C" fn(XDisplay) -> c_int;
type XGetGeometryFn = unsafe extern "C" fn(
    XDisplay,
    Drawable,
    *mut Drawable,
    *mut c_int,
    *mut c_int,
    *mut c_uint,
    *mut c_uint,
    *mut c_uint,
    *mut c_uint,
) -> c_int;

const LIBX11: &str = "libX11.so.6";

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Failed to load libX11.so.6: {0}")]
    Library(#[source] libloading::Error),
    #[error("Xlib symbol missing: {0}")]
    Symbol(#[source] libloading::Error),
    #[error("Cannot open X display {0:?}")]
    Open(Option<String>),
}

pub struct XlibDisplay {
    display: XDisplay,
    screen: c_int,
    close_display: XCloseDisplayFn,
    get_geometry: XGetGeometryFn,
    _lib: libloading::Library,
}

// The display connection is only used behind the driver lock.
unsafe impl Send for XlibDisplay {}

impl XlibDisplay {
    /// Open `name`, or `$DISPLAY` when `None`.
    pub fn open(name: Option<&str>) -> Result<Self, DisplayError> {
        let c_name = name.and_then(|n| CString::new(n).ok());

        unsafe {
            let lib = libloading::Library::new(LIBX11).map_err(DisplayError::Library)?;
            let open_display: XOpenDisplayFn = *lib.get(b"XOpenDisplay\0").map_err(DisplayError::Symbol)?;
            let close_display: XCloseDisplayFn = *lib.get(b"XCloseDisplay\0").map_err(DisplayError::Symbol)?;
            let default_screen: XDefaultScreenFn = *lib.get(b"XDefaultScreen\0").map_err(DisplayError::Symbol)?;
            let get_geometry: XGetGeometryFn = *lib.get(b"XGetGeometry\0").map_err(DisplayError::Symbol)?;

            let display = open_display(c_name.as_ref().map_or(ptr::null(), |n| n.as_ptr()));
            if display.is_null() {
                return Err(DisplayError::Open(name.map(str::to_string)));
            }
            let screen = default_screen(display);
            tracing::info!("X display opened, default screen {}", screen);

            Ok(Self {
                display,
                screen,
                close_display,
                get_geometry,
                _lib: lib,
            })
        }
    }

    /// The Xlib `Display*` for handing to VDPAU.
    pub fn raw(&self) -> *mut c_void {
        self.display
    }

    pub fn screen(&self) -> c_int {
        self.screen
    }
}

impl DrawableProvider for XlibDisplay {
    fn drawable_size(&self, drawable: Drawable) -> BackendResult<(u32, u32)> {
        let mut root: Drawable = 0;
        let (mut x, mut y) = (0, 0);
        let (mut width, mut height, mut border, mut depth) = (0, 0, 0, 0);

        let ok = unsafe {
            (self.get_geometry)(
                self.display,
                drawable,
                &mut root,
                &mut x,
                &mut y,
                &mut width,
                &mut height,
                &mut border,
                &mut depth,
            )
        };
        if ok == 0 {
            return Err(BackendError::NoGeometry(drawable));
        }
        Ok((width, height))
    }
}

impl Drop for XlibDisplay {
    fn drop(&mut self) {
        unsafe {
            (self.close_display)(self.display);
        }
    }
}
