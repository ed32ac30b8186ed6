//! Page grouping and assignment
//!
//! Consumes the ordered per-page detection results for a whole document and
//! partitions page indices into ordered output groups. Pages that decoded
//! cleanly key their group by the (customer, delivery-number) pair; every
//! other page is a "no-barcode page" whose fate is decided by the configured
//! [`NoBarcodePolicy`].
//!
//! The whole pass is pure and single-forward: one open-key pointer, no other
//! state. Running it twice on the same input yields identical output.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::detect::PageDetection;

/// How pages without a complete barcode pair are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoBarcodePolicy {
    /// Drop the page from all output entirely.
    Ignore,
    /// Collect all such pages into one dedicated output, emitted last.
    Separate,
    /// Append the page to the most recent barcode group; leading pages with
    /// no prior group are dropped.
    KeepWithPrevious,
    /// Same behavior as `KeepWithPrevious`: pages ride along with the last
    /// barcode group until a new barcode pair starts the next one.
    Sequential,
}

/// Unknown policy names are a configuration error, surfaced before any page
/// is processed.
#[derive(Debug, Error)]
#[error("unknown no-barcode policy '{0}' (expected ignore, separate, keep_with_previous or sequential)")]
pub struct ParsePolicyError(String);

impl FromStr for NoBarcodePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(NoBarcodePolicy::Ignore),
            "separate" => Ok(NoBarcodePolicy::Separate),
            "keep_with_previous" => Ok(NoBarcodePolicy::KeepWithPrevious),
            "sequential" => Ok(NoBarcodePolicy::Sequential),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

impl fmt::Display for NoBarcodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoBarcodePolicy::Ignore => "ignore",
            NoBarcodePolicy::Separate => "separate",
            NoBarcodePolicy::KeepWithPrevious => "keep_with_previous",
            NoBarcodePolicy::Sequential => "sequential",
        };
        f.write_str(name)
    }
}

/// Policy behavior as data, so the two attach policies share one code path.
struct PolicyBehavior {
    attaches_to_last_group: bool,
    collects_separate: bool,
}

fn behavior(policy: NoBarcodePolicy) -> PolicyBehavior {
    match policy {
        NoBarcodePolicy::Ignore => PolicyBehavior {
            attaches_to_last_group: false,
            collects_separate: false,
        },
        NoBarcodePolicy::Separate => PolicyBehavior {
            attaches_to_last_group: false,
            collects_separate: true,
        },
        NoBarcodePolicy::KeepWithPrevious | NoBarcodePolicy::Sequential => PolicyBehavior {
            attaches_to_last_group: true,
            collects_separate: false,
        },
    }
}

/// Identity of an output group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// A complete (customer, delivery-number) barcode pair.
    Barcodes {
        customer: String,
        delivery: String,
    },
    /// The dedicated group for no-barcode pages under the `separate` policy.
    NoBarcode,
}

impl GroupKey {
    fn barcodes(customer: &str, delivery: &str) -> Self {
        GroupKey::Barcodes {
            customer: customer.to_string(),
            delivery: delivery.to_string(),
        }
    }
}

/// One output document: the key that named it and the source pages it
/// contains, in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGroup {
    pub key: GroupKey,
    /// Strictly increasing source page indices.
    pub page_indices: Vec<usize>,
}

/// Partition ordered per-page results into ordered output groups under the
/// given policy.
///
/// A success page continues the open group when its key matches, otherwise
/// it starts a new one. Any non-success page closes the open key (a later
/// identical pair starts a fresh group) and is dropped, collected, or
/// attached according to the policy. Groups are emitted in order of their
/// first contributing page; the `separate` sentinel group, if populated, is
/// emitted last.
pub fn group_pages(results: &[PageDetection], policy: NoBarcodePolicy) -> Vec<PageGroup> {
    let behavior = behavior(policy);
    let mut groups: Vec<PageGroup> = Vec::new();
    let mut sentinel_pages: Vec<usize> = Vec::new();
    let mut open_key: Option<GroupKey> = None;

    for result in results {
        let key = match (&result.customer_name, &result.delivery_number) {
            (Some(customer), Some(delivery)) if result.is_success() => {
                Some(GroupKey::barcodes(customer, delivery))
            }
            // Partial detections never start groups.
            _ => None,
        };

        match key {
            Some(key) => {
                if open_key.as_ref() == Some(&key) {
                    if let Some(open) = groups.last_mut() {
                        open.page_indices.push(result.page_index);
                    }
                } else {
                    groups.push(PageGroup {
                        key: key.clone(),
                        page_indices: vec![result.page_index],
                    });
                    open_key = Some(key);
                }
            }
            None => {
                open_key = None;
                if behavior.collects_separate {
                    sentinel_pages.push(result.page_index);
                } else if behavior.attaches_to_last_group {
                    match groups.last_mut() {
                        Some(last) => last.page_indices.push(result.page_index),
                        None => debug!(
                            page = result.page_index,
                            "leading no-barcode page has no prior group; dropped"
                        ),
                    }
                } else {
                    debug!(page = result.page_index, "no-barcode page dropped");
                }
            }
        }
    }

    if !sentinel_pages.is_empty() {
        groups.push(PageGroup {
            key: GroupKey::NoBarcode,
            page_indices: sentinel_pages,
        });
    }

    groups
}
