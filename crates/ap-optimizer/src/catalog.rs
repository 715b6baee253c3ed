//! Protocol reference catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ap_types::{validate_risk_score, ApError, ApResult, ProtocolInfo, ProtocolUpdate};

/// Ordered set of candidate protocols, keyed by id.
///
/// Insertion order is preserved; it is the tie-break order when two protocols
/// score the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolCatalog {
    protocols: Vec<ProtocolInfo>,
}

impl ProtocolCatalog {
    pub fn new(protocols: Vec<ProtocolInfo>) -> Self {
        let mut catalog = Self {
            protocols: Vec::with_capacity(protocols.len()),
        };
        for protocol in protocols {
            catalog.insert(protocol);
        }
        catalog
    }

    /// The three protocols shipped with the product.
    pub fn builtin() -> Self {
        Self::new(vec![
            ProtocolInfo::new("aave", "Aave V3", Decimal::new(45, 1), 2, Decimal::from(10), 0),
            ProtocolInfo::new(
                "compound",
                "Compound Finance",
                Decimal::new(38, 1),
                3,
                Decimal::from(50),
                0,
            ),
            ProtocolInfo::new(
                "yearn",
                "Yearn Vault",
                Decimal::new(82, 1),
                6,
                Decimal::from(100),
                7 * 24 * 60 * 60,
            ),
        ])
    }

    /// Add a protocol, replacing any entry with the same id in place.
    pub fn insert(&mut self, protocol: ProtocolInfo) {
        match self.protocols.iter_mut().find(|p| p.id == protocol.id) {
            Some(existing) => *existing = protocol,
            None => self.protocols.push(protocol),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProtocolInfo> {
        self.protocols.iter().find(|p| p.id == id)
    }

    /// Merge `update` into the entry `id`.
    pub fn update(&mut self, id: &str, update: &ProtocolUpdate) -> ApResult<&ProtocolInfo> {
        if let Some(score) = update.risk_score {
            validate_risk_score(score, "risk_score")?;
        }
        let protocol = self
            .protocols
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ApError::not_found("Protocol", id))?;
        protocol.apply_update(update);
        Ok(protocol)
    }

    pub fn as_slice(&self) -> &[ProtocolInfo] {
        &self.protocols
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtocolInfo> {
        self.protocols.iter()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl Default for ProtocolCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn builtin_catalog() {
        let catalog = ProtocolCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        let ids: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["aave", "compound", "yearn"]);
        assert_eq!(catalog.get("yearn").unwrap().current_apy, dec!(8.2));
        assert_eq!(catalog.get("yearn").unwrap().lockup_period, 604_800);
    }

    #[test]
    fn insert_replaces_same_id() {
        let mut catalog = ProtocolCatalog::builtin();
        catalog.insert(ProtocolInfo::new("aave", "Aave V4", dec!(5), 2, dec!(10), 0));
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.as_slice()[0].name, "Aave V4");
    }

    #[test]
    fn update_unknown_protocol_is_not_found() {
        let mut catalog = ProtocolCatalog::builtin();
        let err = catalog
            .update("curve", &ProtocolUpdate::apy(dec!(3)))
            .unwrap_err();
        assert!(matches!(err, ApError::NotFound { .. }));
    }

    #[test]
    fn update_rejects_out_of_range_score() {
        let mut catalog = ProtocolCatalog::builtin();
        let err = catalog
            .update("aave", &ProtocolUpdate::default().with_risk_score(12))
            .unwrap_err();
        assert!(matches!(err, ApError::InvalidArgument(_)));
        assert_eq!(catalog.get("aave").unwrap().risk_score, 2);
    }

    #[test]
    fn catalog_json_is_a_plain_list() {
        let json = serde_json::to_value(ProtocolCatalog::builtin()).unwrap();
        assert!(json.is_array());
        let back: ProtocolCatalog = serde_json::from_value(json).unwrap();
        assert_eq!(back, ProtocolCatalog::builtin());
    }
}
