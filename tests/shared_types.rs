//! Compile-time guards on types shared between pawns.
use possession::{PawnConfig, PawnExtension};
use static_assertions::{assert_impl_all, assert_not_impl_any};

assert_impl_all!(PawnConfig: Send, Sync);
assert_not_impl_any!(PawnExtension: Clone);
