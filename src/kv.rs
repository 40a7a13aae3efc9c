// Copyright 2018-2022 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A small ordered key-value list, used to attach diagnostic fields to
//! tracing spans and to the `Display` impl of [`crate::polyhedron::Polyhedron`].

use std::fmt;

/// An insertion-ordered list of `(key, value)` string pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kv(Vec<(String, String)>);

impl Kv {
    /// An empty list.
    pub fn new() -> Self {
        Kv(Vec::new())
    }

    /// Append `(key, value)`, `value` rendered via `Display`.
    pub fn with(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Kv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    send_sync_test!(kv, Kv);

    #[test]
    fn renders_in_insertion_order() {
        let kv = Kv::new().with("dim", 3).with("status", "empty");
        assert_eq!(kv.to_string(), "dim: 3, status: empty");
    }
}
