// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// A one-line conditional expression.  Rust's `if` is already an
/// expression, but `cargo fmt` spreads it over five lines, and the
/// left/right edge clipping tables read far better as a column of
/// `cq!(at_edge, clipped, neighbor)` rows.
#[macro_export]
macro_rules! cq {
    ($condition: expr, $when_true: expr, $when_false: expr) => {
        if $condition {
            $when_true
        } else {
            $when_false
        }
    };
}
