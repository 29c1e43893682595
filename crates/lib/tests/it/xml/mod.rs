//! XML codec tests

mod codec_tests;
