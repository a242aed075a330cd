/// Where haarcascade XML files are fetched from when not cached locally.
pub const CASCADE_BASE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades";

pub const FRONTAL_FACE_CASCADE: &str = "haarcascade_frontalface_default";
pub const PROFILE_FACE_CASCADE: &str = "haarcascade_profileface";
pub const EYE_CASCADE: &str = "haarcascade_eye";

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];
