//! JSON codec tests

mod codec_tests;
