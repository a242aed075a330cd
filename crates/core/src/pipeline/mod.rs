pub mod anonymize_video_use_case;
pub mod pipeline_logger;
