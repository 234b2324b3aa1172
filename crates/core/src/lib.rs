//! Face gallery and nearest-neighbour identity matching.
//!
//! A gallery maps identity names to reference embeddings derived from a
//! reference corpus of images. Recognition extracts an embedding per face
//! from a query image and reports the closest identity within tolerance.

pub mod corpus {
    pub mod domain {
        pub mod image_loader;
        pub mod reference_corpus;
    }
    pub mod infrastructure {
        pub mod directory_corpus;
        pub mod image_file_loader;
    }
}

pub mod detection {
    pub mod domain {
        pub mod face_encoder;
    }
    pub mod infrastructure {
        pub mod command_face_encoder;
    }
}

pub mod gallery {
    pub mod domain {
        pub mod gallery;
        pub mod gallery_store;
        pub mod identity_name;
    }
    pub mod infrastructure {
        pub mod json_gallery_store;
        pub mod memory_gallery_store;
    }
}

pub mod matching {
    pub mod domain {
        pub mod candidate_set;
        pub mod distance;
        pub mod match_result;
        pub mod matcher;
    }
}

pub mod pipeline {
    pub mod gallery_lifecycle;
    pub mod rebuild_gallery_use_case;
    pub mod recognition_outcome;
    pub mod recognition_service;
    pub mod recognize_faces_use_case;

    #[cfg(test)]
    pub(crate) mod test_support;
}

pub mod shared {
    pub mod constants;
    pub mod embedding;
    pub mod frame;
    pub mod region;
}
