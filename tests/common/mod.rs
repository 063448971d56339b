/// Common test utilities and page fixtures.
///
/// This module provides builders for synthetic worksheet pages used in the
/// integration tests. These are not part of the production library.
pub mod fixtures;
