/*! Integration tests for Arbor.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - value: Tests for values, keys, paths and timestamps
 * - container: Tests for the storage backends as seen through nodes
 * - node: Tests for ownership, listeners, atomics, bulk operations and threading
 * - ops: Tests for path walking, cloning, comparison, patching and repair
 * - json: Tests for the JSON codec
 * - xml: Tests for the XML codec
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("arbor=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod container;
mod json;
mod node;
mod ops;
mod value;
mod xml;
