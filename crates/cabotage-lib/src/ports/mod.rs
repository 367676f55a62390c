//! Port data: the static catalog, gate-aware nearest-port selection and
//! per-port hotel factors.
//!
//! - [`catalog`] - Port records, alias resolution and load-time integrity checks
//! - [`selector`] - Gate-aware nearest-port selection
//! - [`hotel`] - Hotel-at-berth fuel factors keyed by canonical port name

pub mod catalog;
pub mod hotel;
pub mod selector;

pub use catalog::{Gate, Port, PortCatalog};
pub use hotel::{HotelFactorSource, HotelFactors};
pub use selector::{PortRole, PortSelection, PortSelector};

/// Normalize a port label for lookup: case-folded, Latin diacritics removed,
/// whitespace trimmed and collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| word.chars().map(fold_char).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Drop a leading "porto de/do/da" (or bare "porto") from a normalized label.
/// Returns `None` when there is no such prefix or nothing follows it.
pub fn strip_port_prefix(normalized: &str) -> Option<&str> {
    let rest = normalized.strip_prefix("porto ")?;
    let rest = ["de ", "do ", "da ", "dos ", "das "]
        .iter()
        .find_map(|article| rest.strip_prefix(article))
        .unwrap_or(rest);
    (!rest.is_empty()).then_some(rest)
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_label, strip_port_prefix};

    #[test]
    fn folds_case_diacritics_and_whitespace() {
        assert_eq!(normalize_label("  Itajaí   (SC) "), "itajai (sc)");
        assert_eq!(normalize_label("SÃO  Luís"), "sao luis");
        assert_eq!(normalize_label("Pecém"), normalize_label("pecem"));
    }

    #[test]
    fn strips_port_prefixes() {
        assert_eq!(strip_port_prefix("porto de salvador (ba)"), Some("salvador (ba)"));
        assert_eq!(strip_port_prefix("porto do rio"), Some("rio"));
        assert_eq!(strip_port_prefix("porto santos"), Some("santos"));
        assert_eq!(strip_port_prefix("portobelo"), None);
        assert_eq!(strip_port_prefix("santos"), None);
        assert_eq!(strip_port_prefix("porto "), None);
    }
}
