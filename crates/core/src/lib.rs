//! Capture, emotion analysis and persistence building blocks shared by the
//! `emotion-capture` utility and the `emotion-service` HTTP service.

pub mod analysis {
    pub mod domain {
        pub mod analysis_report;
        pub mod emotion;
        pub mod emotion_analyzer;
        pub mod emotion_classifier;
        pub mod face_locator;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod domain {
        pub mod frame_source;
        pub mod image_upload;
    }
    pub mod infrastructure;
}

pub mod persistence {
    pub mod domain {
        pub mod image_writer;
    }
    pub mod infrastructure {
        pub mod image_file_writer;
        pub mod temp_image_file;
    }
}

pub mod pipeline {
    pub mod capture_emotion_use_case;
    pub mod emotion_invoker;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod model_resolver;
}
