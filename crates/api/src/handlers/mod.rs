pub mod media;
pub mod playback;
