pub mod image_decoder;
pub mod image_file_source;

#[cfg(all(feature = "v4l2", target_os = "linux"))]
pub mod v4l2_camera;
