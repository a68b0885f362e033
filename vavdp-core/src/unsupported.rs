// UNSUPPORTED - Entry points the VDPAU translation does not provide
//
// Each returns VA_STATUS_ERROR_UNIMPLEMENTED without touching driver state.

use crate::driver::Driver;
use crate::error::VaError;
use crate::heap::Handle;
use crate::va::*;

macro_rules! unimplemented_entry_points {
    ($( fn $name:ident($($arg:ident: $ty:ty),* $(,)?); )*) => {
        impl Driver {
            $(
                pub fn $name(&mut self, $($arg: $ty),*) -> Result<(), VaError> {
                    $( let _ = $arg; )*
                    tracing::debug!("{} is not implemented", stringify!($name));
                    Err(VaError::Unimplemented)
                }
            )*
        }
    };
}

unimplemented_entry_points! {
    // Surfaces
    fn lock_surface(surface: Handle);
    fn unlock_surface(surface: Handle);
    fn query_surface_status(surface: Handle);
    fn query_surface_error(surface: Handle, error_status: VAStatus);
    fn export_surface_handle(surface: Handle, mem_type: u32, flags: u32);

    // Buffers
    fn buffer_set_num_elements(buffer: Handle, num_elements: u32);
    fn acquire_buffer_handle(buffer: Handle, mem_type: u32);
    fn release_buffer_handle(buffer: Handle);
    fn create_buffer2(context: Handle, buffer_type: VABufferType, width: u32, height: u32);
    fn sync_buffer(buffer: Handle, timeout_ns: u64);

    // Images
    fn derive_image(surface: Handle);
    fn put_image(surface: Handle, image: Handle, src: VARectangle, dst: VARectangle);
    fn set_image_palette(image: Handle, palette: &[u8]);

    // Subpictures
    fn query_subpicture_formats();
    fn create_subpicture(image: Handle);
    fn destroy_subpicture(subpicture: VAGenericID);
    fn set_subpicture_image(subpicture: VAGenericID, image: Handle);
    fn set_subpicture_chromakey(subpicture: VAGenericID, min: u32, max: u32, mask: u32);
    fn set_subpicture_global_alpha(subpicture: VAGenericID, alpha: f32);
    fn associate_subpicture(
        subpicture: VAGenericID,
        surfaces: &[Handle],
        src: VARectangle,
        dst: VARectangle,
        flags: u32,
    );
    fn deassociate_subpicture(subpicture: VAGenericID, surfaces: &[Handle]);

    // Display attributes
    fn query_display_attributes();
    fn get_display_attributes(attrib_types: &[i32]);
    fn set_display_attributes(attribs: &[(i32, i32)]);

    // Multi-frame contexts
    fn create_mf_context();
    fn mf_add_context(mf_context: VAGenericID, context: Handle);
    fn mf_release_context(mf_context: VAGenericID, context: Handle);
    fn mf_submit(mf_context: VAGenericID, contexts: &[Handle]);

    // Misc
    fn query_processing_rate(config: Handle);
    fn copy(flags: u32);
}
