//! Device enumeration collection
//!
//! Two visitation policies over discovered devices: print each identity as
//! it is visited, or collect identities into an [`Enumeration`] and render
//! the whole collection once after the scan. Both always tell the driver to
//! close the visited device and continue.

use std::fmt;

use crate::device::{DeviceIdent, NvmeDevice, Visit};

/// Ordered collection of discovered device identities
///
/// Appends happen in discovery order; nothing is deduplicated or reordered.
/// The capacity hint is an optimization only, appends beyond it succeed.
#[derive(Debug, Default)]
pub struct Enumeration {
    idents: Vec<DeviceIdent>,
}

impl Enumeration {
    pub fn with_capacity(hint: usize) -> Self {
        Self {
            idents: Vec::with_capacity(hint),
        }
    }

    pub fn push(&mut self, ident: DeviceIdent) {
        self.idents.push(ident);
    }

    pub fn len(&self) -> usize {
        self.idents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceIdent> {
        self.idents.iter()
    }
}

impl fmt::Display for Enumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.idents.is_empty() {
            return write!(f, "devices: ~");
        }
        writeln!(f, "devices:")?;
        for ident in &self.idents {
            writeln!(f, "  - {{{ident}}}")?;
        }
        Ok(())
    }
}

/// Print policy: render each identity inline as it is discovered
///
/// Emits the collection-open newline before the first device. The caller is
/// responsible for the leading header and for emitting the empty-collection
/// marker (`~`) when `count` stayed at zero.
pub fn print_visitor(count: &mut u32, dev: &mut dyn NvmeDevice) -> Visit {
    if *count == 0 {
        println!();
    }
    println!("  - {{{}}}", dev.ident());
    *count += 1;
    Visit::CloseDevice
}

/// Collect policy: append the identity for later bulk rendering
pub fn collect_visitor(list: &mut Enumeration, dev: &mut dyn NvmeDevice) -> Visit {
    list.push(dev.ident().clone());
    Visit::CloseDevice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceDriver, DeviceOptions};
    use crate::test_utils::MockDriver;

    fn driver_with(count: u32) -> MockDriver {
        let mut driver = MockDriver::default();
        for i in 0..count {
            driver.add(&format!("mock:{i}"), 1);
        }
        driver
    }

    #[test]
    fn test_collect_preserves_discovery_order() {
        let driver = driver_with(3);
        let mut list = Enumeration::with_capacity(1);

        driver
            .enumerate(None, &DeviceOptions::default(), &mut |dev| {
                collect_visitor(&mut list, dev)
            })
            .unwrap();

        // capacity hint of 1 did not cap the appends
        assert_eq!(list.len(), 3);
        let uris: Vec<&str> = list.iter().map(|i| i.uri.as_str()).collect();
        assert_eq!(uris, ["mock:0", "mock:1", "mock:2"]);
    }

    #[test]
    fn test_empty_enumeration_renders_marker() {
        let list = Enumeration::default();
        assert_eq!(list.to_string(), "devices: ~");
    }

    #[test]
    fn test_print_visitor_counts_devices() {
        let driver = driver_with(2);
        let mut count = 0u32;

        driver
            .enumerate(None, &DeviceOptions::default(), &mut |dev| {
                print_visitor(&mut count, dev)
            })
            .unwrap();

        assert_eq!(count, 2);
    }

    #[test]
    fn test_zero_devices_leaves_count_untouched() {
        let driver = driver_with(0);
        let mut count = 0u32;

        driver
            .enumerate(None, &DeviceOptions::default(), &mut |dev| {
                print_visitor(&mut count, dev)
            })
            .unwrap();

        assert_eq!(count, 0);
    }
}
