use crate::entities::{listing_link, product_variant};
use crate::services::marketplace::{RemoteItem, RemoteVariation};

/// The remote coordinate a sync run writes to or reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCoordinate {
    /// The item itself carries the quantity (no variations).
    Item {
        item_id: String,
        available_quantity: i32,
    },
    /// A specific variation of the item.
    Variation {
        item_id: String,
        variation_id: String,
        available_quantity: i32,
    },
}

impl ResolvedCoordinate {
    pub fn available_quantity(&self) -> i32 {
        match self {
            ResolvedCoordinate::Item {
                available_quantity, ..
            }
            | ResolvedCoordinate::Variation {
                available_quantity, ..
            } => *available_quantity,
        }
    }
}

/// Successful resolution. `discovered_variation_id` is set when the
/// variation id was recovered from the local SKU and should be persisted on
/// the listing link so future runs resolve directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub coordinate: ResolvedCoordinate,
    pub discovered_variation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The link points at a variation the item no longer has, while other
    /// variations remain. The variation was likely deleted remotely; writing
    /// anywhere else could corrupt stock, so the unit is skipped.
    #[error("variation {variation_id} no longer exists on item {item_id}")]
    StaleVariation {
        item_id: String,
        variation_id: String,
    },
    /// No variation could be tied to the local unit. Defaulting to the first
    /// variation or to the item total is forbidden; the unit is skipped.
    #[error("cannot match any of the {variations} variations of item {item_id} to SKU {sku:?}")]
    Ambiguous {
        item_id: String,
        sku: Option<String>,
        variations: usize,
    },
}

/// Determine which remote coordinate corresponds to the linked variant.
///
/// Recovery of an unset variation id uses two ordered strategies against the
/// local SKU: an exact match on the variation's seller SKU field, then a
/// substring match (the local SKU containing the variation id, a naming
/// convention where codes embed the platform's variation id). Each strategy
/// must produce exactly one candidate; anything else is `Ambiguous`.
pub fn resolve(
    link: &listing_link::Model,
    item: &RemoteItem,
    variant: &product_variant::Model,
) -> Result<Resolution, ResolveError> {
    if item.variations.is_empty() {
        // Also covers a stale variation id on an item whose variations were
        // all removed remotely: the item-level quantity is authoritative.
        return Ok(Resolution {
            coordinate: ResolvedCoordinate::Item {
                item_id: item.id.clone(),
                available_quantity: item.available_quantity,
            },
            discovered_variation_id: None,
        });
    }

    if let Some(variation_id) = link.remote_variation_id.as_deref() {
        return match item.variations.iter().find(|v| v.id == variation_id) {
            Some(variation) => Ok(Resolution {
                coordinate: ResolvedCoordinate::Variation {
                    item_id: item.id.clone(),
                    variation_id: variation.id.clone(),
                    available_quantity: variation.available_quantity,
                },
                discovered_variation_id: None,
            }),
            None => Err(ResolveError::StaleVariation {
                item_id: item.id.clone(),
                variation_id: variation_id.to_string(),
            }),
        };
    }

    let ambiguous = |sku: Option<&str>| ResolveError::Ambiguous {
        item_id: item.id.clone(),
        sku: sku.map(str::to_string),
        variations: item.variations.len(),
    };

    let sku = variant.sku.as_deref().filter(|s| !s.is_empty());
    if let Some(sku) = sku {
        match single_match(&item.variations, |v| v.seller_sku.as_deref() == Some(sku)) {
            Match::One(variation) => return Ok(recovered(item, variation)),
            Match::Many => return Err(ambiguous(Some(sku))),
            Match::None => {}
        }
        match single_match(&item.variations, |v| {
            !v.id.is_empty() && sku.contains(v.id.as_str())
        }) {
            Match::One(variation) => return Ok(recovered(item, variation)),
            Match::Many => return Err(ambiguous(Some(sku))),
            Match::None => {}
        }
    }

    Err(ambiguous(sku))
}

fn recovered(item: &RemoteItem, variation: &RemoteVariation) -> Resolution {
    Resolution {
        coordinate: ResolvedCoordinate::Variation {
            item_id: item.id.clone(),
            variation_id: variation.id.clone(),
            available_quantity: variation.available_quantity,
        },
        discovered_variation_id: Some(variation.id.clone()),
    }
}

enum Match<'a> {
    One(&'a RemoteVariation),
    Many,
    None,
}

/// A recovery strategy must single out one variation; more than one hit is
/// as ambiguous as none.
fn single_match<F>(variations: &[RemoteVariation], predicate: F) -> Match<'_>
where
    F: Fn(&RemoteVariation) -> bool,
{
    let mut hits = variations.iter().filter(|v| predicate(v));
    match (hits.next(), hits.next()) {
        (Some(variation), None) => Match::One(variation),
        (Some(_), Some(_)) => Match::Many,
        (None, _) => Match::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use uuid::Uuid;

    fn variant(sku: Option<&str>) -> product_variant::Model {
        product_variant::Model {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            sku: sku.map(str::to_string),
            stock_quantity: 5,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn link(variation_id: Option<&str>) -> listing_link::Model {
        listing_link::Model {
            id: Uuid::new_v4(),
            variant_id: Uuid::new_v4(),
            platform: "marketplace".into(),
            remote_item_id: "ITEM1".into(),
            remote_variation_id: variation_id.map(str::to_string),
            stock_synced: None,
            last_sync_at: None,
            status: "active".into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn variation(id: &str, qty: i32, seller_sku: Option<&str>) -> RemoteVariation {
        RemoteVariation {
            id: id.into(),
            available_quantity: qty,
            seller_sku: seller_sku.map(str::to_string),
        }
    }

    fn item(qty: i32, variations: Vec<RemoteVariation>) -> RemoteItem {
        RemoteItem {
            id: "ITEM1".into(),
            title: "Linen shirt".into(),
            available_quantity: qty,
            variations,
        }
    }

    #[test]
    fn item_without_variations_resolves_to_item_level() {
        let resolution = resolve(&link(None), &item(12, vec![]), &variant(Some("SKU-1"))).unwrap();
        assert_eq!(
            resolution.coordinate,
            ResolvedCoordinate::Item {
                item_id: "ITEM1".into(),
                available_quantity: 12
            }
        );
        assert_eq!(resolution.discovered_variation_id, None);
    }

    #[test]
    fn known_variation_id_resolves_directly() {
        let remote = item(0, vec![variation("V1", 3, None), variation("V2", 7, None)]);
        let resolution = resolve(&link(Some("V2")), &remote, &variant(None)).unwrap();
        assert_eq!(
            resolution.coordinate,
            ResolvedCoordinate::Variation {
                item_id: "ITEM1".into(),
                variation_id: "V2".into(),
                available_quantity: 7
            }
        );
        assert_eq!(resolution.discovered_variation_id, None);
    }

    #[test]
    fn deleted_variation_with_others_remaining_is_stale() {
        let remote = item(0, vec![variation("V1", 3, None)]);
        let err = resolve(&link(Some("V9")), &remote, &variant(None)).unwrap_err();
        assert_matches!(err, ResolveError::StaleVariation { ref variation_id, .. } if variation_id == "V9");
    }

    #[test]
    fn stale_variation_id_falls_back_to_item_when_all_variations_removed() {
        let resolution = resolve(&link(Some("V9")), &item(4, vec![]), &variant(None)).unwrap();
        assert_eq!(resolution.coordinate.available_quantity(), 4);
        assert_matches!(resolution.coordinate, ResolvedCoordinate::Item { .. });
    }

    #[test]
    fn exact_seller_sku_match_recovers_variation() {
        let remote = item(
            0,
            vec![
                variation("V1", 3, Some("OTHER")),
                variation("V2", 7, Some("SKU-1")),
            ],
        );
        let resolution = resolve(&link(None), &remote, &variant(Some("SKU-1"))).unwrap();
        assert_eq!(resolution.discovered_variation_id.as_deref(), Some("V2"));
        assert_eq!(resolution.coordinate.available_quantity(), 7);
    }

    #[test]
    fn substring_match_recovers_variation() {
        let remote = item(0, vec![variation("MA-S", 2, None), variation("MA-M", 9, None)]);
        let resolution = resolve(&link(None), &remote, &variant(Some("AULM080CEF-MA-S"))).unwrap();
        assert_eq!(resolution.discovered_variation_id.as_deref(), Some("MA-S"));
        assert_eq!(resolution.coordinate.available_quantity(), 2);
    }

    #[test]
    fn exact_match_wins_over_substring_match() {
        let remote = item(
            0,
            vec![
                variation("CEF", 1, None),
                variation("V2", 8, Some("AULM080CEF-MA-S")),
            ],
        );
        let resolution = resolve(&link(None), &remote, &variant(Some("AULM080CEF-MA-S"))).unwrap();
        assert_eq!(resolution.discovered_variation_id.as_deref(), Some("V2"));
    }

    #[test]
    fn no_match_is_ambiguous_never_first_variation() {
        let remote = item(0, vec![variation("V1", 3, None), variation("V2", 7, None)]);
        let err = resolve(&link(None), &remote, &variant(Some("SKU-1"))).unwrap_err();
        assert_matches!(err, ResolveError::Ambiguous { variations: 2, .. });
    }

    #[test]
    fn missing_sku_is_ambiguous() {
        let remote = item(0, vec![variation("V1", 3, None)]);
        let err = resolve(&link(None), &remote, &variant(None)).unwrap_err();
        assert_matches!(err, ResolveError::Ambiguous { sku: None, .. });
    }

    #[test]
    fn duplicate_seller_skus_are_ambiguous() {
        let remote = item(
            0,
            vec![
                variation("V1", 3, Some("SKU-1")),
                variation("V2", 7, Some("SKU-1")),
            ],
        );
        let err = resolve(&link(None), &remote, &variant(Some("SKU-1"))).unwrap_err();
        assert_matches!(err, ResolveError::Ambiguous { .. });
    }
}
