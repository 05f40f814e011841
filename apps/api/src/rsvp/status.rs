use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::errors::AppError;

/// Upper bound on ids accepted by one status lookup.
pub const MAX_STATUS_IDS: usize = 100;

/// Parses a comma-separated id list, dropping blanks and duplicates.
pub fn parse_id_list(raw: &str) -> Result<Vec<Uuid>, AppError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = Uuid::parse_str(part)
            .map_err(|_| AppError::Validation(format!("Invalid event id '{part}'")))?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    if ids.len() > MAX_STATUS_IDS {
        return Err(AppError::Validation(format!(
            "At most {MAX_STATUS_IDS} event ids per request"
        )));
    }
    Ok(ids)
}

/// One entry per requested id, true when the student holds an RSVP for it.
pub fn status_map(requested: &[Uuid], rsvped: &[Uuid]) -> BTreeMap<Uuid, bool> {
    let held: HashSet<&Uuid> = rsvped.iter().collect();
    requested.iter().map(|id| (*id, held.contains(id))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ids = parse_id_list(&format!(" {a}, ,{b},{a} ")).unwrap();
        assert_eq!(ids, vec![a, b]);
        assert!(parse_id_list("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_id_list_rejects_garbage() {
        let err = parse_id_list("42").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_parse_id_list_caps_length() {
        let raw: Vec<String> = (0..=MAX_STATUS_IDS).map(|_| Uuid::new_v4().to_string()).collect();
        assert!(parse_id_list(&raw.join(",")).is_err());
    }

    #[test]
    fn test_status_map_covers_every_requested_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let map = status_map(&[a, b], &[b]);
        assert_eq!(map.len(), 2);
        assert!(!map[&a]);
        assert!(map[&b]);
    }
}
