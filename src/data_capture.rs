pub mod annotate;
pub mod frame;
pub mod recorder;
pub mod video_encoder;

pub use annotate::Annotator;
pub use frame::Frame;
pub use recorder::SessionRecorder;
pub use video_encoder::{EncoderFactory, MjpegEncoder, MjpegEncoderFactory, VideoEncoder};
